//! Command-line argument definitions

use clap::Args;

/// Slider positions are percentages of the video duration
fn slider_position(s: &str) -> Result<u8, String> {
    clap_num::number_range(s, 0, 100)
}

/// Arguments for the edit command
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Trim start slider position (0-100)
    #[arg(short, long, value_parser = slider_position)]
    pub start: Option<u8>,

    /// Trim end slider position (0-100)
    #[arg(short, long, value_parser = slider_position)]
    pub end: Option<u8>,

    /// Filter to apply (0-3, sepia, grayscale, high-contrast, none)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Export the result to the gallery
    #[arg(long)]
    pub save: bool,
}

/// Arguments for the gallery command
#[derive(Args, Debug)]
pub struct GalleryArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
