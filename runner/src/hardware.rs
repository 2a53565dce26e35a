use defmt::info;
use embassy_stm32::Config;
use embassy_stm32::gpio::{Input, Pull};

use crate::usb::UsbHardware;

pub struct InputHardware<'a> {
    pub volume_down: Input<'a>,
    pub next_patch: Input<'a>,
    pub volume_up: Input<'a>,
}

pub struct Hardware<'a> {
    pub usb_hardware: UsbHardware<'a>,
    pub input_hardware: InputHardware<'a>,
}

impl Hardware<'static> {
    pub fn get() -> Hardware<'static> {
        info!("Initializing");

        let mut config = Config::default();
        {
            use embassy_stm32::rcc::*;
            config.rcc.hsi = Some(HSIPrescaler::DIV1);
            config.rcc.csi = true;
            // USB needs the 48 MHz oscillator
            config.rcc.hsi48 = Some(Hsi48Config {
                sync_from_usb: true,
            });
            config.rcc.pll1 = Some(Pll {
                source: PllSource::HSI,
                prediv: PllPreDiv::DIV4,
                mul: PllMul::MUL50,
                divp: Some(PllDiv::DIV2),
                divq: None,
                divr: None,
            });
            config.rcc.sys = Sysclk::PLL1_P;
            config.rcc.ahb_pre = AHBPrescaler::DIV2;
            config.rcc.apb1_pre = APBPrescaler::DIV2;
            config.rcc.apb2_pre = APBPrescaler::DIV2;
            config.rcc.apb3_pre = APBPrescaler::DIV2;
            config.rcc.apb4_pre = APBPrescaler::DIV2;
            config.rcc.voltage_scale = VoltageScale::Scale1;
            config.rcc.mux.usbsel = mux::Usbsel::HSI48;
        }
        let peripherals = embassy_stm32::init(config);

        let usb_hardware = crate::get_usb_hardware!(peripherals);

        // Momentary buttons to ground, so pressed reads low
        let input_hardware = InputHardware {
            volume_down: Input::new(peripherals.PD11, Pull::Up),
            next_patch: Input::new(peripherals.PD12, Pull::Up),
            volume_up: Input::new(peripherals.PD13, Pull::Up),
        };

        Hardware {
            usb_hardware,
            input_hardware,
        }
    }
}
