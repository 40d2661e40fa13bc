//! Main pole follower executable entry point.
//!
//! # Architecture
//!
//! The executable runs the controller against the simulated plant on a
//! simulated millisecond clock. Each cycle:
//!
//!     - Scenario events due at the current time are executed
//!     - The simulated sensors feed the input gate at their own rates
//!     - The controller ticks, reading the encoders and writing the motors
//!     - The plant advances by one inner period
//!     - The tick report is archived
//!
//! With `--real-time` every cycle is paced to the inner period and overruns
//! are reported.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod sim_event;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{info, trace, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use pole_lib::{
    controller::{Controller, ControllerParams},
    hal::sim::SimPlant,
    input_gate::{InputGate, NavInput, Snapshot},
    params::PoleExecParams
};
use sim_event::{SensorLink, SimEvent};
use util::{
    archive::Archiver,
    logger::{logger_init, set_sim_time_ms, LevelFilter},
    script_interpreter::{PendingEvents, ScriptInterpreter},
    session::Session
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pole_exec",
    about = "Runs the pole follower controller against a simulated base"
)]
struct Opts {
    /// Path to the scenario script to execute
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Pace each cycle to the wall clock
    #[structopt(long)]
    real_time: bool,

    /// Stop after this many simulated seconds rather than at the end of the
    /// script
    #[structopt(long)]
    duration_s: Option<f64>,

    /// Minimum level of log messages, at least INFO
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("pole_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Pole Follower Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let ctrl_params: ControllerParams = util::params::load("controller.toml")
        .wrap_err("Could not load controller params")?;
    let exec_params: PoleExecParams = util::params::load("pole_exec.toml")
        .wrap_err("Could not load exec params")?;

    if exec_params.range_period_ms == 0 || exec_params.bearing_period_ms == 0 {
        return Err(eyre!("Sensor periods must be greater than zero"))
    }

    info!("Parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", opts.script);

    let mut si = ScriptInterpreter::<SimEvent>::new(&opts.script)
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} events\n",
        si.get_duration(),
        si.get_num_events()
    );

    // ---- INITIALISE MODULES ----

    let inner_period_ms = ctrl_params.sched.inner_period_ms;
    let inner_dt_s = ctrl_params.sched.inner_dt_s();
    let cycle_period = Duration::from_millis(inner_period_ms as u64);

    let gate = InputGate::new(ctrl_params.input_gate.clone());
    let shared = Snapshot::new(NavInput::default());
    let mut plant = SimPlant::new(exec_params.plant.clone());
    let mut link = SensorLink::default();

    let mut ctrl = Controller::new(ctrl_params, 0)
        .wrap_err("Invalid controller parameters")?;

    let mut archiver = Archiver::from_path(&session, &exec_params.tick_archive_name)
        .wrap_err("Failed to open the tick archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let mut now_ms: u32 = 0;
    let mut num_overruns: u64 = 0;
    let mut num_estops: u64 = 0;
    let mut was_estop = false;

    loop {
        let cycle_start_instant = Instant::now();
        let sim_time_s = now_ms as f64 / 1000.0;
        set_sim_time_ms(now_ms);

        if let Some(duration_s) = opts.duration_s {
            if sim_time_s >= duration_s {
                info!("Requested duration reached, stopping");
                break
            }
        }

        // ---- SCENARIO EVENTS ----

        match si.get_pending(sim_time_s) {
            PendingEvents::None => (),
            PendingEvents::Some(events) => {
                for event in events.iter() {
                    sim_event::exec(event, &mut plant, &mut link, &mut ctrl);
                }
            },
            PendingEvents::EndOfScript => {
                if opts.duration_s.is_none() {
                    info!("End of script reached, stopping");
                    break
                }
            }
        }

        // ---- SENSORS ----

        if !link.range_dropout && now_ms % exec_params.range_period_ms == 0 {
            if let Err(e) = gate.submit_distance(&shared, plant.measure_distance_m(), now_ms) {
                trace!("{}", e);
            }
        }

        if !link.bearing_dropout && now_ms % exec_params.bearing_period_ms == 0 {
            if let Err(e) = gate.submit_bearing(&shared, plant.measure_bearing_deg(), now_ms) {
                trace!("{}", e);
            }
        }

        // ---- CONTROL ----

        let report = ctrl.tick(now_ms, &shared, &mut plant);

        if report.estop && !was_estop {
            num_estops += 1;
        }
        was_estop = report.estop;

        plant.step(inner_dt_s);

        archiver.serialise(&report)
            .wrap_err("Failed to archive the tick report")?;

        // ---- CYCLE MANAGEMENT ----

        if opts.real_time {
            let cycle_dur = Instant::now() - cycle_start_instant;

            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => {
                    num_overruns += 1;
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                    );
                }
            }
        }

        now_ms = now_ms.wrapping_add(inner_period_ms);
    }

    let robot = plant.robot();
    info!("Simulation complete after {:.02} s", now_ms as f64 / 1000.0);
    info!("    Ticks: {}", ctrl.state().num_ticks);
    info!("    Emergency stops: {}", num_estops);
    info!("    Cycle overruns: {}", num_overruns);
    info!(
        "    Final robot pose: ({:.3}, {:.3}) m, {:.1} deg",
        robot.x_m, robot.y_m, robot.heading_rad.to_degrees()
    );
    info!("    Final target distance: {:.3} m", plant.true_distance_m());

    Ok(())
}
