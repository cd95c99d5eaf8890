// Comes from https://github.com/inre/rust-mq/blob/master/netopt

use std::{
    io::{self, Cursor, Read, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

type MockCursor = Cursor<Vec<u8>>;

/// In-memory stream replaying canned server output
///
/// Clones share both buffers, so a test can keep a handle to inspect what
/// the client wrote.
#[derive(Clone, Debug, Default)]
pub struct MockStream {
    reader: Arc<Mutex<MockCursor>>,
    writer: Arc<Mutex<MockCursor>>,
}

fn lock(cursor: &Mutex<MockCursor>) -> MutexGuard<'_, MockCursor> {
    cursor.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockStream {
    /// Creates an empty stream
    pub fn new() -> MockStream {
        MockStream::default()
    }

    /// Creates a stream whose reads return `vec`
    pub fn with_vec(vec: Vec<u8>) -> MockStream {
        MockStream {
            reader: Arc::new(Mutex::new(MockCursor::new(vec))),
            writer: Arc::new(Mutex::new(MockCursor::new(Vec::new()))),
        }
    }

    /// Takes everything written so far
    pub fn take_vec(&mut self) -> Vec<u8> {
        let mut cursor = lock(&self.writer);
        let vec = cursor.get_ref().clone();
        cursor.set_position(0);
        cursor.get_mut().clear();
        vec
    }

    /// Replaces what reads return
    pub fn next_vec(&mut self, vec: &[u8]) {
        let mut cursor = lock(&self.reader);
        cursor.set_position(0);
        cursor.get_mut().clear();
        cursor.get_mut().extend_from_slice(vec);
    }
}

impl Write for MockStream {
    fn write(&mut self, msg: &[u8]) -> io::Result<usize> {
        lock(&self.writer).write(msg)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.writer).flush()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        lock(&self.reader).read(buf)
    }
}
