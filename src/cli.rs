use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-smartpress",
    about = "Content-aware image compression that never makes a file bigger",
    long_about = "img-smartpress scores each image's complexity, picks an output format, quality and size for it, \
                  and compresses single files or whole directory trees in parallel. \
                  If no encoding beats the original, the original bytes are kept.",
    version,
    after_help = "EXAMPLES:\n  \
    img-smartpress compress photo.jpg\n  \
    img-smartpress compress photo.png -o small.webp -q 75\n  \
    img-smartpress compress ./images -o ./compressed -w 1920 -H 1080 --progress\n  \
    img-smartpress compress logo.png -f png -f webp --json\n  \
    img-smartpress analyze photo.png"
)]
pub struct Args {
    #[arg(short = 'Q', long, global = true, help = "Only log errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Log per-file decisions and retries")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress an image file or a directory of images",
        long_about = "Compress a single image, or every image under a directory. \
                      Without overrides the format and quality are chosen per image from its content."
    )]
    Compress {
        #[arg(help = "Input image file or directory")]
        input: PathBuf,

        #[arg(
            short = 'o',
            long,
            help = "Output file or directory",
            long_help = "For a single file: a path with an image extension is written verbatim, \
                         anything else is treated as a directory. \
                         For a directory input: the output root; subdirectories are mirrored under it. \
                         Defaults to writing next to each input."
        )]
        output: Option<PathBuf>,

        #[arg(
            short = 'f',
            long = "format",
            help = "Output format (jpeg, png, webp); repeat for several",
            long_help = "Force the output format. Repeat the flag to encode each input into several formats. \
                         Supported formats: jpeg/jpg, png, webp"
        )]
        formats: Vec<String>,

        #[arg(
            short = 'q',
            long,
            help = "Quality for lossy output (1-100)",
            long_help = "Quality from 1 (lowest) to 100 (highest) for JPEG and WebP output. \
                         PNG is always lossless. Without it, quality is tuned to each image's complexity."
        )]
        quality: Option<u8>,

        #[arg(
            short = 'w',
            long,
            help = "Maximum width in pixels",
            long_help = "Shrink images wider than this, preserving aspect ratio. Never upscales."
        )]
        width: Option<u32>,

        #[arg(
            short = 'H',
            long,
            help = "Maximum height in pixels",
            long_help = "Shrink images taller than this, preserving aspect ratio. Never upscales."
        )]
        height: Option<u32>,

        #[arg(long, help = "Only process the top level of a directory")]
        no_recursive: bool,

        #[arg(
            short = 'j',
            long,
            help = "Number of parallel threads (default: auto)",
            long_help = "Number of worker threads for directory input. \
                         If not specified, uses the CPU count, reduced when available memory is low."
        )]
        threads: Option<usize>,

        #[arg(long, help = "Engine configuration file (JSON)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Print the result as JSON")]
        json: bool,

        #[arg(long, help = "Show a progress bar for directory input")]
        progress: bool,
    },

    #[command(
        about = "Score an image and show the plan compress would use",
        long_about = "Decode an image, report its dimensions, alpha, complexity scores \
                      and the encoding plan an override-free compress would execute."
    )]
    Analyze {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,

        #[arg(long, help = "Engine configuration file (JSON)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}
