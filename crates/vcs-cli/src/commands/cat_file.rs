use std::io::{self, Write};

use anyhow::{bail, Result};
use bstr::ByteSlice;
use clap::Args;
use vcs_hash::ObjectId;
use vcs_object::{Object, ObjectType};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct CatFileArgs {
    /// Show object type
    #[arg(short = 't', conflicts_with_all = ["size", "pretty"])]
    type_only: bool,

    /// Show object size
    #[arg(short = 's', conflicts_with_all = ["type_only", "pretty"])]
    size: bool,

    /// Pretty-print the object content
    #[arg(short = 'p', conflicts_with_all = ["type_only", "size"])]
    pretty: bool,

    /// Object to show, as a hex object ID (or a type followed by one, e.g. `blob <id>`)
    #[arg(value_name = "arg")]
    positional: Vec<String>,
}

pub fn run(args: &CatFileArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let (expected_type, object_str) = if args.type_only || args.size || args.pretty {
        if args.positional.is_empty() {
            bail!("missing object argument");
        }
        (None, args.positional[0].as_str())
    } else if args.positional.len() >= 2 {
        let parsed_type: ObjectType = args.positional[0]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid object type: {}", args.positional[0]))?;
        (Some(parsed_type), args.positional[1].as_str())
    } else if args.positional.len() == 1 {
        (None, args.positional[0].as_str())
    } else {
        bail!("usage: cat-file (-t | -s | -p | <type>) <object>");
    };

    let oid = ObjectId::from_hex(object_str)
        .map_err(|_| anyhow::anyhow!("not a valid object id: {}", object_str))?;

    if args.type_only {
        writeln!(out, "{}", repo.object_type(&oid)?)?;
        return Ok(0);
    }

    if args.size {
        let (_, data) = repo.extract_to_mem(&oid)?;
        writeln!(out, "{}", data.len())?;
        return Ok(0);
    }

    let obj = repo.open_object(&oid)?;

    if let Some(expected_type) = expected_type {
        if obj.object_type() != expected_type {
            bail!("expected {} but got {}", expected_type, obj.object_type());
        }
        out.write_all(&obj.serialize_content())?;
        return Ok(0);
    }

    pretty_print(&obj, &mut out)?;
    Ok(0)
}

fn pretty_print(obj: &Object, out: &mut impl Write) -> Result<()> {
    match obj {
        Object::Blob(blob) => {
            out.write_all(&blob.data)?;
        }
        Object::Tree(tree) => {
            for entry in tree.iter() {
                let type_name = if entry.mode.is_tree() {
                    "tree"
                } else if entry.mode.is_gitlink() {
                    "commit"
                } else {
                    "blob"
                };
                writeln!(
                    out,
                    "{:06o} {} {}\t{}",
                    entry.mode.raw(),
                    type_name,
                    entry.oid.to_hex(),
                    entry.name.as_bstr(),
                )?;
            }
        }
        Object::Commit(commit) => {
            writeln!(out, "tree {}", commit.tree.to_hex())?;
            for parent in &commit.parents {
                writeln!(out, "parent {}", parent.to_hex())?;
            }
            writeln!(out, "author {}", commit.author.to_bytes().as_bstr())?;
            writeln!(out, "committer {}", commit.committer.to_bytes().as_bstr())?;
            if let Some(ref gpgsig) = commit.gpgsig {
                write!(out, "gpgsig ")?;
                out.write_all(gpgsig)?;
                writeln!(out)?;
            }
            for (key, value) in &commit.extra_headers {
                writeln!(out, "{} {}", key.as_bstr(), value.as_bstr())?;
            }
            writeln!(out)?;
            out.write_all(&commit.message)?;
        }
        Object::Tag(tag) => {
            writeln!(out, "object {}", tag.target.to_hex())?;
            writeln!(out, "type {}", tag.target_type)?;
            writeln!(out, "tag {}", tag.tag_name.as_bstr())?;
            if let Some(ref tagger) = tag.tagger {
                writeln!(out, "tagger {}", tagger.to_bytes().as_bstr())?;
            }
            writeln!(out)?;
            out.write_all(&tag.message)?;
        }
    }
    Ok(())
}
