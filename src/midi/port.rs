use super::{MidiMessage, MidiTransport};
use crate::{Error, Result};
use log::info;
use midir::{MidiOutput, MidiOutputConnection};

/// System MIDI output, either a hardware/software port or a virtual port
pub struct MidiPort {
    client_name: String,
    connection: Option<MidiOutputConnection>,
    port_name: Option<String>,
}

impl MidiPort {
    /// Create a closed port owned by the given MIDI client name
    #[must_use]
    pub fn new(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            connection: None,
            port_name: None,
        }
    }

    /// Names of the available output ports, in index order
    ///
    /// # Errors
    ///
    /// Returns an error if the MIDI backend cannot be initialised
    pub fn list_ports(client_name: &str) -> Result<Vec<String>> {
        let output = MidiOutput::new(client_name).map_err(|e| Error::Midi(format!("Failed to init MIDI: {e}")))?;
        output
            .ports()
            .iter()
            .map(|port| output.port_name(port).map_err(|e| Error::Midi(e.to_string())))
            .collect()
    }

    /// Open the output port at `index`, closing any current connection
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the port cannot be opened
    pub fn open(&mut self, index: usize) -> Result<()> {
        self.close();

        let output =
            MidiOutput::new(&self.client_name).map_err(|e| Error::Midi(format!("Failed to init MIDI: {e}")))?;
        let ports = output.ports();
        let port = ports
            .get(index)
            .ok_or_else(|| Error::Midi(format!("No MIDI output port with index {index} ({} available)", ports.len())))?;
        let name = output.port_name(port).map_err(|e| Error::Midi(e.to_string()))?;

        let connection = output
            .connect(port, &self.client_name)
            .map_err(|e| Error::Midi(format!("Could not open MIDI port {name}: {e}")))?;

        info!("MIDI port opened: {name}");
        self.connection = Some(connection);
        self.port_name = Some(name);
        Ok(())
    }

    /// Create and open a virtual output port other applications can connect to
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses to create the port
    #[cfg(unix)]
    pub fn open_virtual(&mut self, port_name: &str) -> Result<()> {
        use midir::os::unix::VirtualOutput;

        self.close();

        let output =
            MidiOutput::new(&self.client_name).map_err(|e| Error::Midi(format!("Failed to init MIDI: {e}")))?;
        let connection = output
            .create_virtual(port_name)
            .map_err(|e| Error::Midi(format!("Could not create virtual port {port_name}: {e}")))?;

        info!("Virtual MIDI port created: {port_name}");
        self.connection = Some(connection);
        self.port_name = Some(port_name.to_string());
        Ok(())
    }

    /// Virtual ports are not available on this platform
    ///
    /// # Errors
    ///
    /// Always returns an error
    #[cfg(not(unix))]
    pub fn open_virtual(&mut self, port_name: &str) -> Result<()> {
        Err(Error::Midi(format!(
            "Virtual MIDI ports are not supported on this platform ({port_name})"
        )))
    }

    /// Close the current connection, if any
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            if let Some(name) = self.port_name.take() {
                info!("MIDI port closed: {name}");
            }
        }
    }

    /// Name of the open port
    #[must_use]
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }
}

impl MidiTransport for MidiPort {
    fn send(&mut self, message: MidiMessage) -> Result<()> {
        let Some(connection) = self.connection.as_mut() else {
            return Ok(());
        };
        connection
            .send(&message.to_bytes())
            .map_err(|e| Error::Midi(format!("MIDI send failed: {e}")))
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }
}

impl Drop for MidiPort {
    fn drop(&mut self) {
        self.close();
    }
}
