use crate::simulator::{Channel, PipeChannel};
use crate::ChannelError;
use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Create a connected in-process channel pair. Frames written on one end
/// are read on the other.
pub fn pipe() -> (PipeChannel, PipeChannel) {
    let (left_sender, right_receiver) = mpsc::channel();
    let (right_sender, left_receiver) = mpsc::channel();
    (
        PipeChannel {
            sender: left_sender,
            receiver: left_receiver,
            pending: VecDeque::new(),
            opened: false,
        },
        PipeChannel {
            sender: right_sender,
            receiver: right_receiver,
            pending: VecDeque::new(),
            opened: false,
        },
    )
}

impl Channel for PipeChannel {
    fn open(&mut self) -> Result<(), ChannelError> {
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ChannelError> {
        if !self.opened {
            return Err(ChannelError::Io("the channel is not open".into()));
        }
        self.sender
            .send(data.to_vec())
            .map_err(|_| ChannelError::Closed)?;
        Ok(data.len())
    }

    fn read(&mut self, timeout: Duration) -> Result<Vec<u8>, ChannelError> {
        if !self.opened {
            return Err(ChannelError::Io("the channel is not open".into()));
        }
        if let Some(frame) = self.pending.pop_front() {
            return Ok(frame);
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Err(ChannelError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::Closed),
        }
    }

    fn check_received(&mut self) -> bool {
        loop {
            match self.receiver.try_recv() {
                Ok(frame) => self.pending.push_back(frame),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        !self.pending.is_empty()
    }
}
