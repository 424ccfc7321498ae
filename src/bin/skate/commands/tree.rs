//! `skate tree` command

use anyhow::Result;

use skate::ops::{self, TreeOptions};

use crate::cli::{GlobalOpts, TreeArgs};

pub fn execute(global: GlobalOpts, args: TreeArgs) -> Result<i32> {
    let env = super::environment(global)?;
    let opts = TreeOptions {
        depth: args.depth,
        duplicates: args.duplicates,
    };

    let rendered = ops::tree(&env, &args.file, &opts)?;
    print!("{}", rendered);
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(0)
}
