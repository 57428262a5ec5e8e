use std::io;
use std::path::PathBuf;

use dump_writer::{DumpOptions, DumpWriter, EndRevision};
use structopt::StructOpt;

mod session;
use session::UnconnectedSession;

#[derive(Debug, StructOpt)]
#[structopt(about = "dumps a remote Subversion-family repository to a dumpstream on stdout")]
struct Opt {
    #[structopt(long, help = "remote repository URL")]
    url: String,

    #[structopt(long, default_value = "0", help = "first revision to dump")]
    start: u64,

    #[structopt(long, help = "last revision to dump (defaults to the server's HEAD)")]
    end: Option<u64>,

    #[structopt(long, help = "emit only the selected range; may omit the dumpstream header")]
    incremental: bool,

    #[structopt(long, help = "emit synthetic empty revisions so local revision numbers match remote ones")]
    keep_revnums: bool,

    #[structopt(long, help = "emit file text as svndiff windows (forces dump format 3)")]
    use_deltas: bool,

    #[structopt(long, help = "walk the tree without fetching text or emitting content")]
    dry_run: bool,

    #[structopt(long, help = "suppress the dumpstream header on an incremental dump that starts past revision 0")]
    no_incremental_header: bool,

    #[structopt(long, help = "path prepended to every path in the emitted dumpstream")]
    prefix: Option<String>,

    #[structopt(
        long,
        parse(from_os_str),
        help = "working directory for persisted path/property state; defaults to a fresh temporary directory"
    )]
    temp_dir: Option<PathBuf>,

    #[structopt(long, default_value = "2", help = "dumpstream format version (2 or 3)")]
    dump_format: u8,

    #[structopt(long, default_value = "", help = "remote subtree to dump, relative to the repository root")]
    session_prefix: String,
}

impl Opt {
    fn dump_options(&self, temp_dir: PathBuf) -> DumpOptions {
        DumpOptions {
            session_prefix: self.session_prefix.clone(),
            start: self.start,
            end: match self.end {
                Some(rev) => EndRevision::Literal(rev),
                None => EndRevision::Head,
            },
            incremental: self.incremental,
            keep_revnums: self.keep_revnums,
            use_deltas: self.use_deltas,
            dry_run: self.dry_run,
            no_incremental_header: self.no_incremental_header,
            output_prefix: self.prefix.clone(),
            temp_dir,
            dump_format: self.dump_format,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    flexi_logger::Logger::try_with_env_or_str("info")?
        .log_to_stderr()
        .start()?;

    log::info!("dumping {} from revision {}", opt.url, opt.start);

    let (temp_dir, owns_temp_dir) = match &opt.temp_dir {
        Some(dir) => (dir.clone(), false),
        None => (tempfile::tempdir()?.into_path(), true),
    };

    let session = UnconnectedSession::new(opt.url.clone());

    let options = opt.dump_options(temp_dir.clone());
    let format = options.format_version()?;
    let mut dump_writer = DumpWriter::open(options)?;

    let stdout = io::stdout();
    let mut writer = dumpstream::Writer::new(stdout.lock(), format);

    match dump_writer.run(&session, &mut writer).await {
        Ok(()) => {
            if owns_temp_dir {
                let _ = std::fs::remove_dir_all(&temp_dir);
            }
            log::info!("dump complete");
            Ok(())
        }
        Err(e) => {
            log::error!("dump failed, leaving working state in {}", temp_dir.display());
            Err(e.into())
        }
    }
}
