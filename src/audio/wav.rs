// WAV adapter - decode to a single-channel, sample-rate-labeled signal
//
// Thin seam between the external file-decoding collaborator and the
// extraction pipeline. Multi-channel input is down-mixed by averaging
// channels per frame index. Decode errors are propagated unchanged;
// retry policy belongs to the caller.

use std::path::Path;

use crate::error::AnalysisError;

/// Decoded single-channel audio with its sample rate
#[derive(Debug, Clone)]
pub struct MonoSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoSignal {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Load a WAV file and down-mix it to mono
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<MonoSignal, AnalysisError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(AnalysisError::UnsupportedChannelLayout { channels: 0 });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(MonoSignal {
        samples: downmix(&interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved channels into a mono signal
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
