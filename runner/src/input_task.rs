use defmt::info;
use embassy_executor::SpawnToken;
use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Ticker};
use panel::{Button, EdgeDetector, PanelEvent};
use static_cell::StaticCell;

use crate::hardware::InputHardware;
use crate::panel_task::PANEL_EVENT_CHANNEL;

const POLL_PERIOD_MS: u64 = 10;

pub struct PanelButton<'a> {
    input: Input<'a>,
    edge: EdgeDetector,
    button: Button,
}

impl<'a> PanelButton<'a> {
    pub fn new(input: Input<'a>, button: Button) -> PanelButton<'a> {
        let edge = EdgeDetector::new(input.is_high());
        PanelButton {
            input,
            edge,
            button,
        }
    }
}

pub struct InputTaskState<'a> {
    buttons: [PanelButton<'a>; 3],
}

impl<'a> InputTaskState<'a> {
    pub fn new(input_hardware: InputHardware<'a>) -> Self {
        Self {
            buttons: [
                PanelButton::new(input_hardware.volume_down, Button::VolumeDown),
                PanelButton::new(input_hardware.next_patch, Button::NextPatch),
                PanelButton::new(input_hardware.volume_up, Button::VolumeUp),
            ],
        }
    }
}

pub static INPUT_TASK_STATE: StaticCell<InputTaskState> = StaticCell::new();

pub fn create_input_task(input_hardware: InputHardware<'static>) -> SpawnToken<impl Sized> {
    input_task(INPUT_TASK_STATE.init(InputTaskState::new(input_hardware)))
}

#[embassy_executor::task]
pub async fn input_task(state: &'static mut InputTaskState<'static>) {
    info!("Input task started");

    let sender = PANEL_EVENT_CHANNEL.sender();
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));

    loop {
        for panel_button in state.buttons.iter_mut() {
            if panel_button.edge.update(panel_button.input.is_high()) {
                info!("Button pressed: {}", panel_button.button);
                sender.send(PanelEvent::Pressed(panel_button.button)).await;
            }
        }

        ticker.next().await;
    }
}
