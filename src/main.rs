use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = relink_probe::cli::parse();
    app::run(args)
}
