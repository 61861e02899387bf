use marble_sim::config::SimConfig;
use marble_sim::sim::SimulationDriver;
use marble_sim::types::Phase;
use marble_sim::UnitCount;

fn main() -> anyhow::Result<()> {
    // A short track so every count finishes quickly.
    let config = SimConfig {
        target_distance: 2_000.0,
        dt: 1.0,
        ..SimConfig::default()
    };
    let driver = SimulationDriver::new(config)?;

    let counts: Vec<UnitCount> = [10_u32, 50, 100, 250, 500, 1000]
        .into_iter()
        .map(UnitCount::from)
        .collect();

    println!("Sweeping {} marble counts over {} m ...", counts.len(), driver.config().target_distance);
    for (units, result) in counts.iter().zip(driver.sweep(&counts)) {
        match result {
            Ok(s) => println!(
                "{:>6} marbles: {:>10.0} s  ({} days {} h), v = {:.5} m/s",
                units,
                s.elapsed,
                s.duration().days,
                s.duration().hours,
                s.final_velocity
            ),
            Err(err) => println!("{:>6} marbles: {}", units, err),
        }
    }

    // Where does the heaviest load run dry?
    let heaviest = UnitCount::from(1000_u32);
    let empty_at = driver
        .trajectory(heaviest)?
        .filter_map(Result::ok)
        .find(|s| s.phase == Phase::Coasting);
    if let Some(s) = empty_at {
        println!(
            "{} marbles run out at t={:.0} s, x={:.1} m, v={:.5} m/s",
            heaviest, s.time, s.pos, s.vel
        );
    }
    Ok(())
}
