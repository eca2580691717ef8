use super::{Record, Recorder};

/// Buffered recorder.
///
/// Keeps every written record, for example the per-episode summaries of a
/// training run, so that they can be inspected afterwards.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Collects the scalar values stored under `key` in write order.
    ///
    /// Records without the key are skipped.
    pub fn scalars(&self, key: &str) -> Vec<f32> {
        self.buf
            .iter()
            .filter_map(|r| r.get_scalar(key).ok())
            .collect()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_skip_missing_keys() {
        let mut recorder = BufferedRecorder::new();
        recorder.write(Record::from_scalar("loss", 0.5));
        recorder.write(Record::from_scalar("noise_threshold", 1.0));
        recorder.write(Record::from_scalar("loss", 0.25));

        assert_eq!(recorder.len(), 3);
        assert_eq!(recorder.scalars("loss"), vec![0.5, 0.25]);
    }
}
