//! Firmware: four servo channels on D10-D13, one PID-smoothed servo axis
//! commanded over the serial console.
//!
//! Send a digit `0`-`9` to move the servo on D10 to that fraction of its
//! travel, `?` to print its current pulse width in timer ticks.

#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

#[cfg(not(target_arch = "avr"))]
fn main() {}

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_device::atmega328p::Peripherals;
    use core::cell::{Cell, RefCell};
    use critical_section::Mutex;

    use atmega328p_drivers::config::{
        CONSOLE_RX_LEN, CONSOLE_TX_LEN, CPU_FREQ_HZ, SERVO_CONFIG, SERVO_PRESCALER, UART_BAUD,
    };
    use atmega328p_drivers::hal::usart::{self, Usart0};
    use atmega328p_drivers::hal::{board, OverflowCounter, PortPin, Tc1Compare, Tc2FreeRunning};
    use atmega328p_drivers::{
        ControlLoopScheduler, DutyTable, PidConfig, PidController, PulseScheduler, SerialConsole,
        SharedRing,
    };

    const CHANNELS: usize = 4;

    // Output is a slew rate in travel fractions per second
    const AXIS_PID: PidConfig = PidConfig {
        kp: 4.0,
        ki: 0.5,
        kd: 0.0,
        i_max: 0.5,
        d_max: 10.0,
        out_max: 2.0,
    };

    type Servos = PulseScheduler<'static, PortPin, Tc1Compare, CHANNELS>;

    static SERVO_DUTIES: DutyTable<CHANNELS> = DutyTable::new(SERVO_CONFIG.timing());
    static SERVOS: Mutex<RefCell<Option<Servos>>> = Mutex::new(RefCell::new(None));
    static TC2_OVERFLOWS: OverflowCounter = OverflowCounter::new();
    static TX: SharedRing<CONSOLE_TX_LEN> = SharedRing::new();
    static RX: SharedRing<CONSOLE_RX_LEN> = SharedRing::new();

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_COMPA() {
        critical_section::with(|cs| {
            if let Some(servos) = SERVOS.borrow(cs).borrow_mut().as_mut() {
                let _ = servos.on_compare();
            }
        });
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER2_OVF() {
        TC2_OVERFLOWS.record();
    }

    #[avr_device::interrupt(atmega328p)]
    fn USART_UDRE() {
        usart::on_data_register_empty(&TX);
    }

    #[avr_device::interrupt(atmega328p)]
    fn USART_RX() {
        usart::on_receive(&RX);
    }

    #[avr_device::entry]
    fn main() -> ! {
        let dp = Peripherals::take().unwrap();

        let mut serial = Usart0::new(dp.USART0, UART_BAUD);
        let mut console = SerialConsole::new(&TX);
        let mut input = SerialConsole::new(&RX);

        let pins = [board::d10(), board::d11(), board::d12(), board::d13()];
        let timer = Tc1Compare::new(dp.TC1, SERVO_PRESCALER);
        match PulseScheduler::new(&SERVO_DUTIES, pins, timer) {
            Ok(mut servos) => {
                let _ = servos.start();
                critical_section::with(|cs| SERVOS.borrow(cs).replace(Some(servos)));
            }
            Err(e) => {
                let _ = ufmt::uwrite!(console, "servo init failed: {}", e);
                console.write_line("");
            }
        }

        let target = Cell::new(0.0);
        let position = Cell::new(0.0);
        let rate = Cell::new(0.0);
        let mut pids = [PidController::new(&target, &position, &rate, AXIS_PID)];
        let clock = Tc2FreeRunning::new(dp.TC2, &TC2_OVERFLOWS);
        let mut control = ControlLoopScheduler::new(&mut pids, clock, CPU_FREQ_HZ);

        unsafe { avr_device::interrupt::enable() };

        console.info("ATmega328P servo firmware v0.1.0");
        serial.kick();

        loop {
            while let Some(byte) = input.read_byte() {
                match byte {
                    b'0'..=b'9' => {
                        target.set((byte - b'0') as f64 / 9.0);
                        console.debug("target", byte as u16);
                    }
                    b'?' => {
                        let ticks = SERVO_DUTIES.duty_ticks(0).unwrap_or(0);
                        let _ = ufmt::uwrite!(console, "pulse={} ticks", ticks);
                        console.write_line("");
                    }
                    b'\r' | b'\n' => {}
                    _ => console.warn("unknown command"),
                }
            }

            let ticks = control.iterate();
            if ticks > 0 {
                let dt = ticks as f64 / CPU_FREQ_HZ as f64;
                let next = (position.get() + rate.get() * dt).clamp(0.0, 1.0);
                position.set(next);
                let _ = SERVO_DUTIES.set_channel(0, next as f32);
            }

            let dropped = console.take_dropped();
            if dropped > 0 {
                console.debug("tx dropped", dropped);
            }
            if !TX.is_empty() {
                serial.kick();
            }
        }
    }
}
