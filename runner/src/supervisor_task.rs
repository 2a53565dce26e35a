use embassy_executor::SpawnToken;
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use supervisor::{Pace, Supervisor, SupervisorConfig};
use voice_pool::{GateVoice, VoicePool};

use crate::midi_task::{UsbMidiTransport, create_transport};

pub type MidiSupervisor = Supervisor<UsbMidiTransport, GateVoice>;

pub static SUPERVISOR_TASK_STATE: StaticCell<MidiSupervisor> = StaticCell::new();

pub fn create_supervisor_task() -> SpawnToken<impl Sized> {
    let config = SupervisorConfig {
        trace_events: cfg!(feature = "trace-events"),
        ..SupervisorConfig::default()
    };

    let supervisor = Supervisor::new(
        config,
        create_transport(),
        VoicePool::default(),
    );

    supervisor_task(SUPERVISOR_TASK_STATE.init(supervisor))
}

#[embassy_executor::task]
pub async fn supervisor_task(supervisor: &'static mut MidiSupervisor) {
    let scan_interval = Duration::from_millis(supervisor.config().scan_interval_ms.into());
    let poll_interval = Duration::from_micros(supervisor.config().poll_interval_us.into());

    loop {
        match supervisor.step().pace() {
            // Only ever a handful of steps in a row: the queue runs dry and we poll
            Pace::Immediate => {}
            Pace::Poll => Timer::after(poll_interval).await,
            Pace::Scan => Timer::after(scan_interval).await,
        }
    }
}
