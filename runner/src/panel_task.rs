use defmt::info;
use embassy_executor::SpawnToken;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
use panel::{PanelEvent, PanelManager, PanelState};
use static_cell::StaticCell;

#[cfg(feature = "patches-4")]
const PATCH_COUNT: usize = 4;
#[cfg(feature = "patches-8")]
const PATCH_COUNT: usize = 8;

#[cfg(all(feature = "patches-4", feature = "patches-8"))]
compile_error!("feature \"patches-4\" and feature \"patches-8\" cannot be enabled at the same time");
#[cfg(not(any(feature = "patches-4", feature = "patches-8")))]
compile_error!("one of feature \"patches-4\" or feature \"patches-8\" must be enabled");

const PANEL_CHANNEL_SIZE: usize = 8;
pub static PANEL_EVENT_CHANNEL: Channel<CriticalSectionRawMutex, PanelEvent, PANEL_CHANNEL_SIZE> =
    Channel::new();

pub static PANEL_SIGNAL: Signal<CriticalSectionRawMutex, PanelState<PATCH_COUNT>> = Signal::new();

pub struct PanelManagerTaskState<'sig> {
    panel_manager: PanelManager<'sig, CriticalSectionRawMutex, PATCH_COUNT>,
}

impl<'sig> PanelManagerTaskState<'sig> {
    pub fn new(panel_manager: PanelManager<'sig, CriticalSectionRawMutex, PATCH_COUNT>) -> Self {
        Self { panel_manager }
    }
}

pub static PANEL_MANAGER_TASK_STATE: StaticCell<PanelManagerTaskState> = StaticCell::new();

pub fn create_panel_task() -> SpawnToken<impl Sized> {
    let panel_manager = PanelManager::new(&PANEL_SIGNAL);

    panel_manager_task(PANEL_MANAGER_TASK_STATE.init(PanelManagerTaskState::new(panel_manager)))
}

#[embassy_executor::task]
pub async fn panel_manager_task(state: &'static mut PanelManagerTaskState<'static>) {
    let receiver = PANEL_EVENT_CHANNEL.receiver();

    loop {
        let event = receiver.receive().await;
        state.panel_manager.handle_event(event);
    }
}

// Volume goes to the DAC and patches to the synth engine, neither of which
// exists on this board yet.
#[embassy_executor::task]
pub async fn panel_output_task() {
    loop {
        let panel_state = PANEL_SIGNAL.wait().await;
        info!(
            "Panel: volume {} dB, patch {}",
            panel_state.volume_db(),
            panel_state.patch()
        );
    }
}
