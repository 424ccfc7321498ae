//! Running a script: the default command when no subcommand is given.

use anyhow::Result;

use skate::ops::{self, RunMode, RunOptions};
use skate::util::shell::Status;

use crate::cli::{GlobalOpts, RunArgs};

pub fn execute(global: GlobalOpts, args: RunArgs) -> Result<i32> {
    let Some(file) = args.file else {
        return Ok(0);
    };
    let env = super::environment(global)?;

    let opens_file = args.project || args.edit || args.interactive;
    if opens_file && !ops::ensure_file_exists_interactive(&file, args.yes)? {
        return Ok(0);
    }

    if args.edit {
        let dir = ops::edit(&env, &file)?;
        env.shell().status(Status::Linked, dir.display());
        return Ok(0);
    }
    if args.project {
        let dir = ops::project(&env, &file)?;
        println!("Project refreshed at {}", dir.display());
        return Ok(0);
    }

    let mode = if args.interactive {
        RunMode::Interactive
    } else if args.action {
        RunMode::Action(args.args.join("; "))
    } else {
        RunMode::Run(args.args)
    };

    ops::run(&env, &RunOptions { file, mode })
}
