//! Offline patch rendering command.

use anyhow::Context;
use clap::{Args, ValueEnum};
use hound::{SampleFormat, WavSpec, WavWriter};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use via_config::{Patch, get_factory_patch};
use via_modules::{Channel, Outputs, Render};

/// DAC channels to write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CliChannel {
    #[default]
    Dac1,
    Dac2,
    Dac3,
    /// All three DACs as a 3-channel file
    All,
}

impl CliChannel {
    fn channels(self) -> &'static [Channel] {
        match self {
            Self::Dac1 => &[Channel::Dac1],
            Self::Dac2 => &[Channel::Dac2],
            Self::Dac3 => &[Channel::Dac3],
            Self::All => &[Channel::Dac1, Channel::Dac2, Channel::Dac3],
        }
    }
}

#[derive(Args)]
pub struct RenderArgs {
    /// Patch file (TOML), or a factory patch name with --factory
    #[arg(value_name = "PATCH")]
    patch: String,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Treat PATCH as a factory patch name
    #[arg(long)]
    factory: bool,

    /// Override the patch duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// DAC channel(s) to write
    #[arg(long, value_enum, default_value_t = CliChannel::Dac1)]
    channel: CliChannel,
}

/// Unsigned 12-bit DAC code to centred 16-bit PCM.
pub fn dac_to_pcm(code: i32) -> i16 {
    ((code.clamp(0, 4095) - 2048) << 4) as i16
}

/// Render every tick of `patch`, handing each call's DAC1..DAC3 samples to
/// `sink`. Returns the number of samples per channel.
pub fn render_patch<F>(patch: &Patch, progress: &ProgressBar, mut sink: F) -> anyhow::Result<u64>
where
    F: FnMut([&[i32]; 3]) -> anyhow::Result<()>,
{
    let family = patch.family().context("failed to synthesize wavetable family")?;
    let mut module = patch
        .build_module(family.as_ref())
        .context("failed to build module")?;

    let target = patch.render_target();
    let n = target.samples_per_call();
    let mut outputs = Outputs::for_target(target);
    let schedule = patch.schedule();
    progress.set_length(schedule.total_ticks());

    let mut written = 0;
    for (tick, inputs) in schedule.iter().enumerate() {
        module.render(0, &inputs, &mut outputs);
        sink([Channel::Dac1, Channel::Dac2, Channel::Dac3].map(|c| &outputs.channel(c)[..n]))?;
        written += n as u64;
        if tick % 1024 == 0 {
            progress.set_position(tick as u64);
        }
    }
    progress.finish_with_message("done");
    Ok(written)
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut patch = if args.factory {
        get_factory_patch(&args.patch)
            .with_context(|| format!("no factory patch named '{}'", args.patch))?
    } else {
        Patch::load(&args.patch).with_context(|| format!("failed to load patch '{}'", args.patch))?
    };
    if let Some(duration) = args.duration {
        patch.duration_secs = duration;
    }
    patch.validate()?;

    println!("Rendering {} ({})...", patch.name, patch.module.kind());
    println!(
        "  {:?}, {} Hz, {:.2}s, {} ticks",
        patch.render_target(),
        patch.sample_rate,
        patch.duration_secs,
        patch.total_ticks()
    );

    let pb = ProgressBar::new(patch.total_ticks());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let channels = args.channel.channels();
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate: patch.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("failed to create '{}'", args.output.display()))?;

    let samples = render_patch(&patch, &pb, |streams| {
        for i in 0..streams[0].len() {
            for &channel in channels {
                writer.write_sample(dac_to_pcm(streams[channel as usize][i]))?;
            }
        }
        Ok(())
    })?;
    writer.finalize()?;

    tracing::info!(
        samples,
        channels = channels.len(),
        path = %args.output.display(),
        "render written"
    );
    println!("\nWrote {}", args.output.display());
    Ok(())
}
