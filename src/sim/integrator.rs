use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Classical 4th-order Runge-Kutta, fixed step
// ---------------------------------------------------------------------------

/// Single RK4 step of `dy/dt = f(t, y)` from `(t, y)` to `t + dt`.
///
/// No step-size control; the result depends only on the arguments.
pub fn rk4_step<F>(f: F, t: f64, y: &Vector3<f64>, dt: f64) -> Vector3<f64>
where
    F: Fn(f64, &Vector3<f64>) -> Vector3<f64>,
{
    let half = dt * 0.5;
    let k1 = f(t, y);
    let k2 = f(t + half, &(y + k1 * half));
    let k3 = f(t + half, &(y + k2 * half));
    let k4 = f(t + dt, &(y + k3 * dt));

    y + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * (dt / 6.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_derivative_is_exact() {
        let y = rk4_step(|_, _| Vector3::new(1.0, -2.0, 0.5), 0.0, &Vector3::zeros(), 4.0);
        assert_relative_eq!(y, Vector3::new(4.0, -8.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn polynomial_in_time_is_exact() {
        // dy/dt = 3t^2 integrates to t^3; RK4 is exact up to cubic terms.
        let f = |t: f64, _: &Vector3<f64>| Vector3::new(3.0 * t * t, 0.0, 0.0);
        let y = rk4_step(f, 1.0, &Vector3::new(1.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(y[0], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn exponential_decay_is_fourth_order() {
        let f = |_: f64, y: &Vector3<f64>| -y;
        let mut y = Vector3::new(1.0, 2.0, 3.0);
        let dt = 0.01;
        for i in 0..100 {
            y = rk4_step(f, i as f64 * dt, &y, dt);
        }
        let decay = (-1.0_f64).exp();
        assert_relative_eq!(y, Vector3::new(1.0, 2.0, 3.0) * decay, epsilon = 1e-9);
    }

    #[test]
    fn step_is_pure() {
        let f = |t: f64, y: &Vector3<f64>| Vector3::new(y[1], -y[0] + t, 0.1);
        let y0 = Vector3::new(0.3, -1.2, 7.0);
        assert_eq!(rk4_step(f, 2.0, &y0, 0.5), rk4_step(f, 2.0, &y0, 0.5));
    }
}
