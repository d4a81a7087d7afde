use crate::simulator::{AbstractionLayer, Channel, IoLog};
use crate::vocabulary::{Preset, Symbol, SymbolKind};
use crate::{ActorError, ChannelError, ConfigurationError, Memory, Structure};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of the stop flag polling during a blocking read.
const READ_SLICE: Duration = Duration::from_millis(50);

impl AbstractionLayer {
    /// Register a symbol catalogue over a channel. Every symbol is
    /// validated here: relation cycles and malformed domains are rejected
    /// before any actor runs.
    pub fn new(
        channel: Box<dyn Channel>,
        symbols: Vec<Rc<Symbol>>,
    ) -> Result<Self, ConfigurationError> {
        for symbol in &symbols {
            symbol.validate()?;
        }
        Ok(Self {
            channel,
            symbols,
            unknown: Rc::new(Symbol::unknown()),
            timeout: Duration::from_secs(5),
            io_log: IoLog::default(),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Change the delay [read_symbol](AbstractionLayer::read_symbol) waits
    /// for a frame.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn bind_stop(&mut self, stop: Arc<AtomicBool>) {
        self.stop = stop;
    }

    #[inline]
    pub fn symbols(&self) -> &[Rc<Symbol>] {
        &self.symbols
    }

    #[inline]
    pub fn io_log(&self) -> &IoLog {
        &self.io_log
    }

    pub fn open_channel(&mut self) -> Result<(), ChannelError> {
        self.channel.open()
    }

    pub fn close_channel(&mut self) {
        self.channel.close()
    }

    /// Non blocking peek on the channel.
    pub fn check_received(&mut self) -> bool {
        self.channel.check_received()
    }

    /// Specialize `symbol` and send the bytes. The empty symbol writes
    /// nothing but is still recorded as the last sent symbol.
    pub fn write_symbol(
        &mut self,
        symbol: &Rc<Symbol>,
        preset: Option<&Preset>,
        memory: &mut Memory,
    ) -> Result<(usize, Structure), ActorError> {
        let (message, structure) = symbol.specialize(memory, preset)?;
        if symbol.kind() != SymbolKind::Empty {
            self.channel.write(&message)?;
        }
        self.io_log.last_sent_symbol = Some(Rc::clone(symbol));
        self.io_log.last_sent_message = Some(message.clone());
        self.io_log.last_sent_structure = Some(structure.clone());
        Ok((message.len(), structure))
    }

    /// Wait for a frame and abstract it against the catalogue. Bytes no
    /// catalogue entry parses abstract to the unknown symbol, so reception
    /// itself never fails on content.
    pub fn read_symbol(
        &mut self,
        memory: &mut Memory,
    ) -> Result<(Rc<Symbol>, Vec<u8>, Structure), ChannelError> {
        let deadline = Instant::now() + self.timeout;
        let data = loop {
            if self.stop.load(Ordering::Relaxed) {
                return Err(ChannelError::Stopped);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ChannelError::Timeout);
            }
            match self.channel.read(remaining.min(READ_SLICE)) {
                Ok(data) => break data,
                Err(ChannelError::Timeout) => continue,
                Err(err) => return Err(err),
            }
        };

        let (symbol, structure) = self.abstract_message(&data, memory);
        self.io_log.last_received_symbol = Some(Rc::clone(&symbol));
        self.io_log.last_received_message = Some(data.clone());
        self.io_log.last_received_structure = Some(structure.clone());
        Ok((symbol, data, structure))
    }

    fn abstract_message(&self, data: &[u8], memory: &mut Memory) -> (Rc<Symbol>, Structure) {
        for symbol in &self.symbols {
            if let Some(structure) = symbol.parse(data, memory) {
                return (Rc::clone(symbol), structure);
            }
        }
        let structure = self
            .unknown
            .parse(data, memory)
            .expect("the unknown symbol matches anything");
        (Rc::clone(&self.unknown), structure)
    }
}
