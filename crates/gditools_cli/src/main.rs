mod args;

use std::{fs, path::PathBuf};

use anyhow::Context;
use gditools::{
    extractor::{Extractor, SortCriterion},
    iso9660::Iso9660Reader,
    GdiIndex,
};

use crate::args::Args;

fn main() {
    env_logger::init();

    let parsed = args::args().run();

    if let Err(e) = run(parsed) {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if !args.global.silent {
        println!("Opening {}", args.gdi.display());
    }

    let gdi = GdiIndex::open(&args.gdi).context("failed to parse .gdi manifest")?;

    if !args.global.silent && !any_action_requested(&args) {
        print!("{}", gdi.describe());
    }

    let view = gdi.build_view().context("failed to build the logical disc stream")?;
    let reader = Iso9660Reader::open(view).context("failed to parse the ISO9660 filesystem")?;
    let mut extractor = Extractor::new(reader);

    let data_folder = resolve_data_folder(&args, &mut extractor);
    let output_dir = args.output.clone().unwrap_or_else(|| PathBuf::from("."));

    if args.list {
        for record in extractor.reader().gen_records(true)? {
            println!("{}", record.name);
        }
    }

    if let Some(path) = &args.bootsector {
        extractor.dump_bootsector(path).context("failed to write boot sector")?;
        if !args.global.silent {
            println!("Wrote boot sector to {}", path.display());
        }
    }

    if let Some(path) = &args.sorttxt {
        let listing = extractor
            .sorttxt(SortCriterion::ExtentLbaAscending, &data_folder, Some("0.0"), args.sort_spacer)
            .context("failed to build sorttxt listing")?;
        fs::write(path, listing).with_context(|| format!("failed to write {}", path.display()))?;
        if !args.global.silent {
            println!("Wrote sorttxt to {}", path.display());
        }
    }

    if let Some(fs_path) = &args.extract {
        let record = extractor
            .reader()
            .get_record(fs_path)
            .with_context(|| format!("path not found on disc: {}", fs_path))?;
        let out = extractor
            .dump_file(&record, &output_dir.join(&data_folder), true)
            .context("failed to extract file")?;
        if !args.global.silent {
            println!("Extracted {} -> {}", fs_path, out.display());
        }
    }

    if args.extract_all {
        let report = extractor
            .dump_all(&output_dir.join(&data_folder), true, args.best_effort)
            .context("failed to extract all files")?;
        if !args.global.silent {
            println!("Extracted {} files", report.extracted.len());
            if !report.failed.is_empty() {
                println!("{} file(s) failed to extract:", report.failed.len());
                for (name, err) in &report.failed {
                    println!("  {}: {}", name, err);
                }
            }
        }
    }

    Ok(())
}

fn any_action_requested(args: &Args) -> bool {
    args.list || args.bootsector.is_some() || args.sorttxt.is_some() || args.extract.is_some() || args.extract_all
}

fn resolve_data_folder(args: &Args, extractor: &mut Extractor) -> String {
    if args.data_folder == "__volume_label__" {
        extractor.reader().pvd().volume_label()
    }
    else {
        args.data_folder.clone()
    }
}
