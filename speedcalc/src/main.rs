use log::*;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "speedcalc",
    about = "Estimates ground-track speed from a sequence of time-stamped surface photographs"
)]
struct Opt {
    /// The file where settings are specified.
    ///
    /// This is in the format of `ground_speed::Settings`. Defaults are used if it doesn't exist.
    #[structopt(short, long, default_value = "speedcalc-settings.json")]
    settings: PathBuf,
    /// The file the mean speed is written to.
    #[structopt(short, long, default_value = "result.txt")]
    output: PathBuf,
    /// Ground sample distance in centimetres per pixel (overrides the settings file).
    #[structopt(long)]
    gsd: Option<f64>,
    /// Maximum number of keypoints per image (overrides the settings file).
    #[structopt(long)]
    max_features: Option<NonZeroUsize>,
    /// Images in capture order.
    #[structopt(parse(from_os_str))]
    images: Vec<PathBuf>,
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(opt: Opt) -> speedcalc::Result<()> {
    let mut settings = speedcalc::load_settings(&opt.settings)?;
    if let Some(gsd) = opt.gsd {
        settings.ground_sample_distance = gsd;
    }
    if let Some(max_features) = opt.max_features {
        settings.max_features = max_features;
    }
    info!("processing {} images", opt.images.len());
    let mean_speed = speedcalc::estimate_run(&settings, opt.images)?;
    println!("{}", ground_speed::format_speed(mean_speed));
    speedcalc::write_result(&opt.output, mean_speed)?;
    Ok(())
}
