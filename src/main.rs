use clap::Parser;
use smdbg::client::transport::Endpoint;
use smdbg::ui::config::{self, UIConfig};
use smdbg::ui::console::AppBuilder;
use std::path::PathBuf;

const HISTORY_FILE_NAME: &str = ".smdbg_history";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debugger endpoint url, url fragment selects debugger handler path (`debugger` by default)
    #[arg(env = "SMDBG_URL")]
    url: String,

    /// Command history file [default: ~/.smdbg_history]
    #[arg(long, env = "SMDBG_HISTORY")]
    history_file: Option<PathBuf>,

    /// Do not load or save command history
    #[arg(long)]
    no_history: bool,

    /// Print plain text without terminal colors
    #[arg(long)]
    no_color: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let endpoint = Endpoint::parse(&args.url)?;

    let history_file = args
        .history_file
        .or_else(|| home::home_dir().map(|home| home.join(HISTORY_FILE_NAME)));
    config::set(UIConfig {
        save_history: !args.no_history && history_file.is_some(),
        history_file: history_file.unwrap_or_default(),
        colors: !args.no_color,
    });

    let app = AppBuilder::new(endpoint).build()?;
    app.run()
}
