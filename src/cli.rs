// src/cli.rs

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;

use crate::config::MalhConfig;
use crate::consts::{DATA_EXT, INFO_EXT, NO_PAGE, OVFLOW_EXT};
use crate::project::Projection;
use crate::reln::Relation;
use crate::select::Selection;

#[derive(Parser, Debug)]
#[command(
    name = "malh",
    version,
    about = "Multi-attribute linear-hashed file: partial-match indexing over fixed-schema tuples",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a new relation.
    Create {
        name: PathBuf,
        nattrs: u32,
        npages: u32,
        depth: u32,
        /// Choice vector descriptor, e.g. "0:0,1:0,2:0"
        cv: String,
    },
    /// Load tuples from stdin, one per line.
    Insert { name: PathBuf },
    /// Run a partial-match query and print every matching tuple.
    Select {
        name: PathBuf,
        query: String,
        /// Attribute projection: "*" (default) or a 1-based index list, e.g. "2,1"
        #[arg(long, default_value = "*")]
        project: String,
    },
    /// Print global counters, the choice vector, and a per-bucket chain summary.
    Stats { name: PathBuf },
    /// Remove a relation's three files.
    Drop { name: PathBuf },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Create { name, nattrs, npages, depth, cv } => cmd_create(name, nattrs, npages, depth, cv),
        Cmd::Insert { name } => cmd_insert(name),
        Cmd::Select { name, query, project } => cmd_select(name, query, project),
        Cmd::Stats { name } => cmd_stats(name),
        Cmd::Drop { name } => cmd_drop(name),
    }
}

fn cmd_create(name: PathBuf, nattrs: u32, npages: u32, depth: u32, cv: String) -> Result<()> {
    let config = MalhConfig::from_env();
    Relation::create(&name, nattrs, npages, depth, &cv, &config)
        .with_context(|| format!("creating relation {:?}", name))?;
    println!("created {:?}: nattrs={} npages={} depth={}", name, nattrs, npages, depth);
    Ok(())
}

fn cmd_insert(name: PathBuf) -> Result<()> {
    let config = MalhConfig::from_env();
    let mut reln = Relation::open(&name, true, config).with_context(|| format!("opening relation {:?}", name))?;

    let stdin = io::stdin();
    let mut loaded = 0u64;
    let mut skipped = 0u64;
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let tuple = crate::tuple::strip_newline(&line);
        match reln.insert(tuple) {
            Ok(_) => loaded += 1,
            Err(e) => {
                warn!("skipping malformed tuple {:?}: {}", tuple, e);
                skipped += 1;
            }
        }
    }
    reln.close().with_context(|| format!("closing relation {:?}", name))?;
    println!("loaded {} tuples, skipped {}", loaded, skipped);
    Ok(())
}

fn cmd_select(name: PathBuf, query: String, project: String) -> Result<()> {
    let config = MalhConfig::from_env();
    let mut reln = Relation::open(&name, false, config).with_context(|| format!("opening relation {:?}", name))?;
    let nattrs = reln.nattrs();
    let projection = Projection::parse(&project, nattrs).context("parsing --project")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sel = Selection::start(&mut reln, &query).context("starting selection")?;
    while let Some(tuple) = sel.next_tuple().context("scanning relation")? {
        let projected = projection.project(&tuple, nattrs as usize)?;
        writeln!(out, "{}", projected)?;
    }
    drop(sel);
    reln.close().with_context(|| format!("closing relation {:?}", name))?;
    Ok(())
}

fn cmd_stats(name: PathBuf) -> Result<()> {
    let config = MalhConfig::from_env();
    let mut reln = Relation::open(&name, false, config).with_context(|| format!("opening relation {:?}", name))?;

    println!(
        "nattrs={} depth={} sp={} npages={} ntups={}",
        reln.nattrs(),
        reln.depth(),
        reln.sp(),
        reln.npages(),
        reln.ntups()
    );
    print!("cv=");
    for (i, entry) in reln.cv().entries().iter().take(reln.nattrs().max(1) as usize * 8).enumerate() {
        if i > 0 {
            print!(",");
        }
        print!("{}:{}", entry.att, entry.bit);
    }
    println!();

    for bucket in 0..reln.npages() {
        let page = reln.data_page(bucket)?;
        print!("bucket {}: ({}, {} tuples, {} free, ovflow={})", bucket, bucket, page.n_tuples(), page.free_space(), fmt_page_id(page.ovflow()));
        let mut cur = page.ovflow();
        while cur != NO_PAGE {
            let p = reln.ovflow_page(cur)?;
            print!(" -> ({}, {} tuples, {} free, ovflow={})", cur, p.n_tuples(), p.free_space(), fmt_page_id(p.ovflow()));
            cur = p.ovflow();
        }
        println!();
    }

    reln.close().with_context(|| format!("closing relation {:?}", name))?;
    Ok(())
}

fn fmt_page_id(id: u32) -> String {
    if id == NO_PAGE {
        "none".to_string()
    } else {
        id.to_string()
    }
}

fn cmd_drop(name: PathBuf) -> Result<()> {
    let info_path = format!("{}.{}", name.display(), INFO_EXT);
    if !std::path::Path::new(&info_path).exists() {
        return Err(crate::error::MalhError::RelationMissing {
            name: name.display().to_string(),
        }
        .into());
    }
    for ext in [INFO_EXT, DATA_EXT, OVFLOW_EXT] {
        let path = format!("{}.{}", name.display(), ext);
        std::fs::remove_file(&path).with_context(|| format!("removing {:?}", path))?;
    }
    println!("dropped {:?}", name);
    Ok(())
}
