use crate::error::SiglentError;
use crate::instrument::MessageInstrument;
use crate::transport::{self, ConnectionConfig, Transport};
use crate::types::Channel;
use log::debug;

/// Controller for a Siglent SPD3303X / SPD3303X-E bench supply.
///
/// Measurements always refer to the selected channel; select one with
/// [`Spd3303x::select_channel`] or [`Spd3303x::channel`] first.
///
/// # Examples
/// ```no_run
/// use siglent_sa::{Channel, Spd3303x};
///
/// let mut psu = Spd3303x::connect("192.168.1.60")?;
/// let amps = psu.channel(Channel::Ch2)?.measure_current()?;
/// println!("CH2 draws {amps:.3} A");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Spd3303x<T: Transport = Box<dyn Transport>> {
    transport: T,
    selected: Option<Channel>,
}

impl Spd3303x {
    pub fn connect(address: &str) -> Result<Self, SiglentError> {
        Self::connect_with(address, &ConnectionConfig::default())
    }

    pub fn connect_with(address: &str, config: &ConnectionConfig) -> Result<Self, SiglentError> {
        Ok(Self::new(transport::open(address, config)?))
    }
}

impl<T: Transport> Spd3303x<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            selected: None,
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Channel most recently selected through this handle
    pub fn selected_channel(&self) -> Option<Channel> {
        self.selected
    }

    pub fn select_channel(&mut self, channel: Channel) -> Result<(), SiglentError> {
        self.send(&format!("INST CH{}", channel.number()))?;
        self.selected = Some(channel);
        debug!("Selected {channel:?}");
        Ok(())
    }

    /// Select `channel` and return `self` for chained measurements
    pub fn channel(&mut self, channel: Channel) -> Result<&mut Self, SiglentError> {
        self.select_channel(channel)?;
        Ok(self)
    }

    /// Output current of the selected channel in A
    pub fn measure_current(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64("MEAS:CURR?")
    }

    /// Output voltage of the selected channel in V
    pub fn measure_voltage(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64("MEAS:VOLT?")
    }

    /// Output power of the selected channel in W
    pub fn measure_power(&mut self) -> Result<f64, SiglentError> {
        self.ask_f64("MEAS:POWE?")
    }
}

impl<T: Transport> MessageInstrument for Spd3303x<T> {
    type Transport = T;

    fn transport(&mut self) -> &mut T {
        &mut self.transport
    }
}
