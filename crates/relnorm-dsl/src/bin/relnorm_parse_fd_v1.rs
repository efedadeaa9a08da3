use std::{env, fs};

use relnorm_dsl::fd_v1::parse_fd_module_v1;
use relnorm_dsl::validate::{validate_module, ValidationLimits};

fn main() {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: relnorm_parse_fd_v1 <file.fd>");
        std::process::exit(2);
    };
    if args.next().is_some() {
        eprintln!("usage: relnorm_parse_fd_v1 <file.fd>");
        std::process::exit(2);
    }

    let text = match fs::read_to_string(&path) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("failed to read `{path}`: {err}");
            std::process::exit(2);
        }
    };

    let module = match parse_fd_module_v1(&text) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = validate_module(&module, &ValidationLimits::default()) {
        eprintln!("invalid: {err}");
        std::process::exit(1);
    }

    println!(
        "ok(fd_v1): module={} attributes={} fds={} relations={}",
        module.module_name.as_deref().unwrap_or("<unnamed>"),
        module.universe().len(),
        module.fds.len(),
        module.relations.len()
    );
}
