use super::*;
use crate::logging::LogSink;
use crate::platform::Platform;
use crate::register_device::BlockingRegisterDevice;
use embedded_hal::i2c::I2c;
use log::LevelFilter;

/// MP2722 battery charger and power path management IC driver.
///
/// Nothing that touches the device is accepted before [`init`](Self::init) succeeds,
/// and charging can only be turned on once both the charge voltage and the charge
/// current were applied.
///
/// The driver is meant to have a single owner. It keeps no lock and performs no
/// retries: every bus error is returned to the caller as is.
#[derive(Debug)]
pub struct Mp2722<I2C> {
    dev: BlockingRegisterDevice<I2C>,
    state: ChargerState,
}

impl<I2C> Mp2722<I2C> {
    /// Creates a driver on the default address (0x3F)
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, MP2722_I2C_ADDRESS)
    }

    /// Creates a driver on an explicit 7-bit address
    pub fn with_address(i2c: I2C, adr: u8) -> Self {
        Self {
            dev: BlockingRegisterDevice::new(Some(i2c), adr),
            state: ChargerState::default(),
        }
    }

    /// Creates a driver from whatever bus and log sink the platform provides.
    ///
    /// Without a bus the driver cannot be initialized.
    pub fn from_platform<P>(platform: &mut P, adr: u8) -> Self
    where
        P: Platform<Bus = I2C>,
    {
        let mut state = ChargerState::default();
        if let Some(sink) = platform.log_sink() {
            state.logger = Logger::new(Some(sink), LevelFilter::Info);
        }
        Self {
            dev: BlockingRegisterDevice::new(platform.take_bus(), adr),
            state,
        }
    }

    /// Installs (or removes, with `None`) the log sink. Messages less severe than
    /// `threshold` are dropped; `LevelFilter::Off` silences the driver.
    pub fn set_log_sink(&mut self, sink: Option<LogSink>, threshold: LevelFilter) {
        self.state.logger = Logger::new(sink, threshold);
    }

    /// Least severe level still handed to the log sink
    pub fn log_threshold(&self) -> LevelFilter {
        self.state.logger.threshold()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Both the charge voltage and the charge current were applied successfully
    pub fn is_safe_to_charge(&self) -> bool {
        self.state.is_safe_to_charge()
    }

    pub fn address(&self) -> u8 {
        self.dev.adr
    }

    /// Consumes the driver and returns the bus handle, if it had one
    pub fn release(self) -> Option<I2C> {
        self.dev.release()
    }
}

impl<I2C> Mp2722<I2C>
where
    I2C: I2c,
{
    /// Probes the device and applies the power-up configuration.
    ///
    /// Forces IIN_MODE to follow IIN_LIM, disables charging, enables automatic
    /// D+/D- detection, the buck converter, auto OTG and boost stop on battery low.
    /// Any failure leaves the driver uninitialized; register changes already made
    /// stay in place.
    pub fn init(&mut self) -> Result<(), ChargerError> {
        if !self.dev.is_bound() {
            self.state.logger.error(format_args!(
                "No I2C bus available, pass one to Mp2722::new or provide it through a Platform"
            ));
            return Err(ChargerError::Fail);
        }

        let config0 = match self.dev.read_register(REG_PROBE) {
            Ok(value) => value,
            Err(e) => {
                self.state
                    .logger
                    .error(format_args!("Failed to communicate with MP2722"));
                return Err(e);
            }
        };

        self.state.initialized = true;

        for step in INIT_SEQUENCE.iter() {
            if let Err(e) = self.dev.update_field(step.field, step.value) {
                self.state.initialized = false;
                self.state.logger.error(format_args!("{}", step.failure));
                return Err(e);
            }
        }

        self.state
            .logger
            .info(format_args!("MP2722 initialized, CONFIG0=0x{:02X}", config0));
        Ok(())
    }

    /// Resets every register to its power-on default.
    ///
    /// The driver has to be initialized and configured again afterwards.
    pub fn reset(&mut self) -> Result<(), ChargerError> {
        self.dev.update_field(REG_RST, REG_RST.flag(true))?;
        self.state.forget_configuration();
        self.state
            .logger
            .warn(format_args!("Registers reset to defaults, init() required"));
        Ok(())
    }

    /// Sets the fast charge current (ICC).
    ///
    /// # Arguments
    /// * `milliampere` - Charge current in mA, clamped to 80-5000mA. Rounded down to
    ///   an 80mA step.
    pub fn set_charge_current(&mut self, milliampere: u16) -> Result<(), ChargerError> {
        self.state.require_initialized()?;

        let steps = ICC_SCALE.steps(milliampere);
        let result = self.dev.update_field(ICC, ICC.encode(steps));
        self.state.charge_current_configured = result.is_ok();
        result?;

        self.state.logger.debug(format_args!(
            "Set charge current: {}mA (0x{:02X})",
            ICC_SCALE.clamp(milliampere),
            steps
        ));
        Ok(())
    }

    /// Sets the battery regulation voltage (VBATT_REG).
    ///
    /// # Arguments
    /// * `millivolt` - Charge voltage in mV, clamped to 3600-4600mV
    pub fn set_charge_voltage(&mut self, millivolt: u16) -> Result<(), ChargerError> {
        self.state.require_initialized()?;

        let steps = VBATT_REG_SCALE.steps(millivolt);
        let result = self.dev.update_field(VBATT_REG, VBATT_REG.encode(steps));
        self.state.charge_voltage_configured = result.is_ok();
        result?;

        self.state.logger.debug(format_args!(
            "Set charge voltage: {}mV (0x{:02X})",
            VBATT_REG_SCALE.clamp(millivolt),
            steps
        ));
        Ok(())
    }

    /// Overrides the input current limit (IIN_LIM).
    ///
    /// The device updates IIN_LIM by itself after every input source detection.
    ///
    /// # Arguments
    /// * `milliampere` - Input current limit in mA, clamped to 100-3200mA
    pub fn set_input_current_limit(&mut self, milliampere: u16) -> Result<(), ChargerError> {
        self.state.require_initialized()?;

        let steps = IIN_LIM_SCALE.steps(milliampere);
        self.state.logger.debug(format_args!(
            "Set input current limit: {}mA (0x{:02X})",
            IIN_LIM_SCALE.clamp(milliampere),
            steps
        ));
        self.dev.update_field(IIN_LIM, IIN_LIM.encode(steps))
    }

    /// Enables or disables charging.
    ///
    /// Enabling fails with [`ChargerError::InvalidState`] until both
    /// [`set_charge_voltage`](Self::set_charge_voltage) and
    /// [`set_charge_current`](Self::set_charge_current) succeeded.
    pub fn set_charging(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_charge_allowed(enable)?;
        self.dev.update_field(EN_CHG, EN_CHG.flag(enable))
    }

    /// Enables or disables the buck converter powering the system from the input
    pub fn set_buck(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(EN_BUCK, EN_BUCK.flag(enable))
    }

    /// Forces the OTG boost converter on or off, regardless of auto OTG
    pub fn set_boost(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(EN_BOOST, EN_BOOST.flag(enable))
    }

    /// Lets USB detection switch the boost converter on when a sink is attached
    pub fn set_auto_otg(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(AUTOOTG, AUTOOTG.flag(enable))
    }

    /// When enabled the BATT_LOW comparator stops boost and latches it off,
    /// otherwise it only raises an interrupt
    pub fn set_boost_stop_on_batt_low(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(BOOST_STP_EN, BOOST_STP_EN.flag(enable))
    }

    /// Enables or disables automatic D+/D- input source detection
    pub fn set_auto_source_detection(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(AUTODPDM, AUTODPDM.flag(enable))
    }

    /// Runs D+/D- input source detection immediately
    pub fn force_source_detection(&mut self) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(FORCEDPDM, FORCEDPDM.flag(true))
    }

    /// Configures the STAT/IB pin.
    ///
    /// # Arguments
    /// * `as_analog_current` - Output the analog battery current (IB) instead of the
    ///   digital STAT signal
    /// * `charging_only` - Only source IB while charging, not while discharging
    pub fn set_status_pin_mode(
        &mut self,
        as_analog_current: bool,
        charging_only: bool,
    ) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev
            .update_field(EN_STAT_IB, EN_STAT_IB.flag(as_analog_current))?;
        self.dev.update_field(IB_EN, IB_EN.flag(!charging_only))
    }

    /// Reads all six status registers in one burst and decodes them
    pub fn get_status(&mut self) -> Result<PowerStatus, ChargerError> {
        self.state.require_initialized()?;

        let regs = self.dev.read_registers::<STATUS_LEN>(REG_STATUS11)?;
        self.state.logger.debug(format_args!(
            "STATUS: R11=0x{:02X} R12=0x{:02X} R13=0x{:02X} R14=0x{:02X} R15=0x{:02X} R16=0x{:02X}",
            regs[0], regs[1], regs[2], regs[3], regs[4], regs[5]
        ));
        Ok(PowerStatus::from_registers(&regs))
    }

    /// Resets the I2C watchdog.
    ///
    /// Has to be repeated within the watchdog period (40s by default), otherwise the
    /// device restores every register to its default and the driver must be set up again.
    pub fn watchdog_kick(&mut self) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(WATCHDOG_RST, WATCHDOG_RST.flag(true))
    }

    pub fn set_watchdog_timer(&mut self, timer: WatchdogTimer) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(WATCHDOG, WATCHDOG.encode(u8::from(timer)))
    }

    pub fn watchdog_timer(&mut self) -> Result<WatchdogTimer, ChargerError> {
        self.state.require_initialized()?;
        Ok(WatchdogTimer::from(self.dev.read_field(WATCHDOG)?))
    }

    /// Disconnects the battery FET.
    ///
    /// The system loses power. Only plugging in USB or holding RST low for about 1.1s
    /// wakes the device up again; there is no way back through the driver.
    pub fn enter_shipping_mode(&mut self) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.state
            .logger
            .warn(format_args!("Entering shipping mode (BATFET off)"));
        self.dev.update_field(BATTFET_DIS, BATTFET_DIS.flag(true))
    }

    /// Charge current currently programmed, in mA
    pub fn charge_current(&mut self) -> Result<u16, ChargerError> {
        self.state.require_initialized()?;
        let raw = self.dev.read_register(ICC.reg)?;
        Ok(ICC_SCALE.decode(raw))
    }

    /// Charge voltage currently programmed, in mV
    pub fn charge_voltage(&mut self) -> Result<u16, ChargerError> {
        self.state.require_initialized()?;
        let raw = self.dev.read_register(VBATT_REG.reg)?;
        Ok(VBATT_REG_SCALE.decode(raw))
    }

    /// Input current limit currently in effect, in mA
    pub fn input_current_limit(&mut self) -> Result<u16, ChargerError> {
        self.state.require_initialized()?;
        let raw = self.dev.read_register(IIN_LIM.reg)?;
        Ok(IIN_LIM_SCALE.decode(raw))
    }

    /// Applies a complete charging configuration.
    ///
    /// Voltage and current go first so that charging, if requested, passes the safety
    /// check. Stops at the first error.
    pub fn apply_config(&mut self, config: &ChargerConfig) -> Result<(), ChargerError> {
        self.set_charge_voltage(config.charge_voltage_mv)?;
        self.set_charge_current(config.charge_current_ma)?;
        self.set_input_current_limit(config.input_current_limit_ma)?;
        self.set_watchdog_timer(config.watchdog)?;
        self.set_charging(config.enable_charging)
    }
}
