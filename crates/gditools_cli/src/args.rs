//! Command-line argument definitions, combinator-style (no derive macro).

use std::path::PathBuf;

use bpaf::{construct, long, short, OptionParser, Parser};

/// Options that every operation consults, threaded through independently of which action flags
/// were passed.
#[derive(Clone, Debug)]
pub struct GlobalOptions {
    pub silent: bool,
}

fn global_options() -> impl Parser<GlobalOptions> {
    let silent = long("silent")
        .help("Suppress informational output")
        .switch();
    construct!(GlobalOptions { silent })
}

#[derive(Clone, Debug)]
pub struct Args {
    pub gdi: PathBuf,
    pub list: bool,
    pub output: Option<PathBuf>,
    pub sorttxt: Option<PathBuf>,
    pub bootsector: Option<PathBuf>,
    pub extract: Option<String>,
    pub extract_all: bool,
    pub best_effort: bool,
    pub data_folder: String,
    pub sort_spacer: u32,
    pub global: GlobalOptions,
}

pub fn args() -> OptionParser<Args> {
    let gdi = short('i')
        .long("gdi")
        .help("Path to the .gdi manifest describing the disc")
        .argument::<PathBuf>("GDI");

    let list = short('l')
        .long("list")
        .help("Print every filesystem path")
        .switch();

    let output = short('o')
        .long("output")
        .help("Base output directory")
        .argument::<PathBuf>("DIR")
        .optional();

    let sorttxt = short('s')
        .long("sorttxt")
        .help("Write a sorttxt disc-order listing to this file")
        .argument::<PathBuf>("FILE")
        .optional();

    let bootsector = short('b')
        .long("bootsector")
        .help("Write the boot sector (ip.bin) to this file")
        .argument::<PathBuf>("FILE")
        .optional();

    let extract = short('e')
        .long("extract")
        .help("Extract a single file by its filesystem path")
        .argument::<String>("PATH")
        .optional();

    let extract_all = long("extract-all")
        .help("Extract every file on the disc")
        .switch();

    let best_effort = long("best-effort")
        .help("With --extract-all, keep going past a single file's extraction failure instead of aborting")
        .switch();

    let data_folder = long("data-folder")
        .help("Prefix for sorttxt entries and the extraction subdirectory; \"__volume_label__\" resolves to the disc's volume label")
        .argument::<String>("NAME")
        .fallback("data".to_string());

    let sort_spacer = long("sort-spacer")
        .help("Rank increment between consecutive sorttxt entries")
        .argument::<u32>("N")
        .fallback(1);

    let global = global_options();

    construct!(Args {
        gdi,
        list,
        output,
        sorttxt,
        bootsector,
        extract,
        extract_all,
        best_effort,
        data_folder,
        sort_spacer,
        global,
    })
    .to_options()
    .descr("Reads a SEGA Dreamcast GD-ROM disc image and extracts its ISO9660 filesystem.")
}
