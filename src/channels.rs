/// Display metadata for one continuous data channel. One entry per data
/// channel of the attached stream; recreated when the channel count
/// changes.
#[derive(Clone, Debug)]
pub struct Channel {
    /// Index into the source buffer's data lanes.
    pub index: usize,
    pub name: String,
    pub sample_rate: f32,
    /// Full-scale voltage range mapped onto the channel band height.
    pub range: f32,
    /// Flip the vertical mapping.
    pub inverted: bool,
    /// Disabled channels keep aggregating but are not drawn.
    pub enabled: bool,
    /// Selected channels get range tick marks.
    pub selected: bool,
}

impl Channel {
    pub fn new(index: usize, sample_rate: f32) -> Self {
        Self {
            index,
            name: format!("CH{}", index + 1),
            sample_rate,
            range: 250.0,
            inverted: false,
            enabled: true,
            selected: false,
        }
    }
}

/// Build the default channel set for a stream.
pub fn default_channels(count: usize, sample_rate: f32) -> Vec<Channel> {
    (0..count).map(|i| Channel::new(i, sample_rate)).collect()
}
