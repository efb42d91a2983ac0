use super::*;
use crate::logging::LogSink;
use crate::platform::Platform;
use crate::register_device::AsyncRegisterDevice;
use embedded_hal_async::i2c::I2c;
use log::LevelFilter;

/// MP2722 battery charger and power path management IC driver, async flavour.
///
/// Same rules as the blocking [`Mp2722`](super::blocking::Mp2722): nothing reaches
/// the device before [`init`](Self::init) succeeds and charging stays off until
/// voltage and current were applied.
#[derive(Debug)]
pub struct Mp2722Async<I2C> {
    dev: AsyncRegisterDevice<I2C>,
    state: ChargerState,
}

impl<I2C> Mp2722Async<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, MP2722_I2C_ADDRESS)
    }

    pub fn with_address(i2c: I2C, adr: u8) -> Self {
        Self {
            dev: AsyncRegisterDevice::new(Some(i2c), adr),
            state: ChargerState::default(),
        }
    }

    pub fn from_platform<P>(platform: &mut P, adr: u8) -> Self
    where
        P: Platform<Bus = I2C>,
    {
        let mut state = ChargerState::default();
        if let Some(sink) = platform.log_sink() {
            state.logger = Logger::new(Some(sink), LevelFilter::Info);
        }
        Self {
            dev: AsyncRegisterDevice::new(platform.take_bus(), adr),
            state,
        }
    }

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

    pub fn is_safe_to_charge(&self) -> bool {
        self.state.is_safe_to_charge()
    }

    pub fn address(&self) -> u8 {
        self.dev.adr
    }

    pub fn release(self) -> Option<I2C> {
        self.dev.release()
    }
}

impl<I2C> Mp2722Async<I2C>
where
    I2C: I2c,
{
    pub async fn init(&mut self) -> Result<(), ChargerError> {
        if !self.dev.is_bound() {
            self.state.logger.error(format_args!(
                "No I2C bus available, pass one to Mp2722Async::new or provide it through a Platform"
            ));
            return Err(ChargerError::Fail);
        }

        let config0 = match self.dev.read_register(REG_PROBE).await {
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
            if let Err(e) = self.dev.update_field(step.field, step.value).await {
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

    pub async fn reset(&mut self) -> Result<(), ChargerError> {
        self.dev.update_field(REG_RST, REG_RST.flag(true)).await?;
        self.state.forget_configuration();
        self.state
            .logger
            .warn(format_args!("Registers reset to defaults, init() required"));
        Ok(())
    }

    /// Charge current in mA, clamped to 80-5000mA
    pub async fn set_charge_current(&mut self, milliampere: u16) -> Result<(), ChargerError> {
        self.state.require_initialized()?;

        let steps = ICC_SCALE.steps(milliampere);
        let result = self.dev.update_field(ICC, ICC.encode(steps)).await;
        self.state.charge_current_configured = result.is_ok();
        result?;

        self.state.logger.debug(format_args!(
            "Set charge current: {}mA (0x{:02X})",
            ICC_SCALE.clamp(milliampere),
            steps
        ));
        Ok(())
    }

    /// Charge voltage in mV, clamped to 3600-4600mV
    pub async fn set_charge_voltage(&mut self, millivolt: u16) -> Result<(), ChargerError> {
        self.state.require_initialized()?;

        let steps = VBATT_REG_SCALE.steps(millivolt);
        let result = self.dev.update_field(VBATT_REG, VBATT_REG.encode(steps)).await;
        self.state.charge_voltage_configured = result.is_ok();
        result?;

        self.state.logger.debug(format_args!(
            "Set charge voltage: {}mV (0x{:02X})",
            VBATT_REG_SCALE.clamp(millivolt),
            steps
        ));
        Ok(())
    }

    /// Input current limit in mA, clamped to 100-3200mA
    pub async fn set_input_current_limit(&mut self, milliampere: u16) -> Result<(), ChargerError> {
        self.state.require_initialized()?;

        let steps = IIN_LIM_SCALE.steps(milliampere);
        self.state.logger.debug(format_args!(
            "Set input current limit: {}mA (0x{:02X})",
            IIN_LIM_SCALE.clamp(milliampere),
            steps
        ));
        self.dev.update_field(IIN_LIM, IIN_LIM.encode(steps)).await
    }

    pub async fn set_charging(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_charge_allowed(enable)?;
        self.dev.update_field(EN_CHG, EN_CHG.flag(enable)).await
    }

    pub async fn set_buck(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(EN_BUCK, EN_BUCK.flag(enable)).await
    }

    pub async fn set_boost(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(EN_BOOST, EN_BOOST.flag(enable)).await
    }

    pub async fn set_auto_otg(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(AUTOOTG, AUTOOTG.flag(enable)).await
    }

    pub async fn set_boost_stop_on_batt_low(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev
            .update_field(BOOST_STP_EN, BOOST_STP_EN.flag(enable))
            .await
    }

    pub async fn set_auto_source_detection(&mut self, enable: bool) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(AUTODPDM, AUTODPDM.flag(enable)).await
    }

    pub async fn force_source_detection(&mut self) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev.update_field(FORCEDPDM, FORCEDPDM.flag(true)).await
    }

    pub async fn set_status_pin_mode(
        &mut self,
        as_analog_current: bool,
        charging_only: bool,
    ) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev
            .update_field(EN_STAT_IB, EN_STAT_IB.flag(as_analog_current))
            .await?;
        self.dev.update_field(IB_EN, IB_EN.flag(!charging_only)).await
    }

    pub async fn get_status(&mut self) -> Result<PowerStatus, ChargerError> {
        self.state.require_initialized()?;

        let regs = self.dev.read_registers::<STATUS_LEN>(REG_STATUS11).await?;
        self.state.logger.debug(format_args!(
            "STATUS: R11=0x{:02X} R12=0x{:02X} R13=0x{:02X} R14=0x{:02X} R15=0x{:02X} R16=0x{:02X}",
            regs[0], regs[1], regs[2], regs[3], regs[4], regs[5]
        ));
        Ok(PowerStatus::from_registers(&regs))
    }

    pub async fn watchdog_kick(&mut self) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev
            .update_field(WATCHDOG_RST, WATCHDOG_RST.flag(true))
            .await
    }

    pub async fn set_watchdog_timer(&mut self, timer: WatchdogTimer) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.dev
            .update_field(WATCHDOG, WATCHDOG.encode(u8::from(timer)))
            .await
    }

    pub async fn watchdog_timer(&mut self) -> Result<WatchdogTimer, ChargerError> {
        self.state.require_initialized()?;
        Ok(WatchdogTimer::from(self.dev.read_field(WATCHDOG).await?))
    }

    /// Disconnects the battery FET. Only USB power or a long RST press brings the
    /// system back.
    pub async fn enter_shipping_mode(&mut self) -> Result<(), ChargerError> {
        self.state.require_initialized()?;
        self.state
            .logger
            .warn(format_args!("Entering shipping mode (BATFET off)"));
        self.dev
            .update_field(BATTFET_DIS, BATTFET_DIS.flag(true))
            .await
    }

    pub async fn charge_current(&mut self) -> Result<u16, ChargerError> {
        self.state.require_initialized()?;
        let raw = self.dev.read_register(ICC.reg).await?;
        Ok(ICC_SCALE.decode(raw))
    }

    pub async fn charge_voltage(&mut self) -> Result<u16, ChargerError> {
        self.state.require_initialized()?;
        let raw = self.dev.read_register(VBATT_REG.reg).await?;
        Ok(VBATT_REG_SCALE.decode(raw))
    }

    pub async fn input_current_limit(&mut self) -> Result<u16, ChargerError> {
        self.state.require_initialized()?;
        let raw = self.dev.read_register(IIN_LIM.reg).await?;
        Ok(IIN_LIM_SCALE.decode(raw))
    }

    pub async fn apply_config(&mut self, config: &ChargerConfig) -> Result<(), ChargerError> {
        self.set_charge_voltage(config.charge_voltage_mv).await?;
        self.set_charge_current(config.charge_current_ma).await?;
        self.set_input_current_limit(config.input_current_limit_ma)
            .await?;
        self.set_watchdog_timer(config.watchdog).await?;
        self.set_charging(config.enable_charging).await
    }
}
