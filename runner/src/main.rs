#![no_std]
#![no_main]

mod hardware;
mod input_task;
mod midi_task;
mod panel_task;
mod supervisor_task;
mod usb;

use defmt::info;
use embassy_executor::Executor;
use static_cell::StaticCell;

use defmt_rtt as _;
use panic_probe as _;

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    let hardware = hardware::Hardware::get();

    let mut builder = usb::create_builder(hardware.usb_hardware);
    let midi_hardware = crate::get_midi_usb_hardware!(&mut builder);
    let usb_device = builder.build();

    info!("Starting tasks");

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(usb::usb_task(usb_device)).unwrap();
        spawner
            .spawn(midi_task::create_midi_task(midi_hardware))
            .unwrap();
        spawner
            .spawn(supervisor_task::create_supervisor_task())
            .unwrap();
        spawner.spawn(panel_task::create_panel_task()).unwrap();
        spawner.spawn(panel_task::panel_output_task()).unwrap();
        spawner
            .spawn(input_task::create_input_task(hardware.input_hardware))
            .unwrap();
    })
}
