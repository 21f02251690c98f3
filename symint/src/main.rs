use clap::Parser as ClapParser;
use std::process;

use symint::{GuardSite, ShapeEnv, SymInt, SymIntError, contiguous_strides, guard_site, numel};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sized dimensions, outermost first
    #[arg(long = "dim", value_name = "NAME=HINT", value_parser = parse_dim)]
    dims: Vec<(String, i64)>,

    /// Dimensions with no example size, appended after --dim
    #[arg(long = "unbacked", value_name = "NAME")]
    unbacked: Vec<String>,

    /// Materialize strides and element count, then print recorded guards
    #[arg(long)]
    guard: bool,
}

fn parse_dim(arg: &str) -> Result<(String, i64), String> {
    let (name, hint) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=HINT, got '{arg}'"))?;
    let hint = hint
        .parse::<i64>()
        .map_err(|err| format!("invalid hint '{hint}': {err}"))?;
    if !(0..=SymInt::MAX).contains(&hint) {
        return Err(format!("hint {hint} is not a valid size"));
    }
    Ok((name.to_owned(), hint))
}

fn join(values: &[SymInt]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn materialize(values: &[SymInt], site: GuardSite) -> Result<Vec<i64>, SymIntError> {
    values.iter().map(|value| value.guard_int(site)).collect()
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let env = ShapeEnv::new();
    let mut shape: Vec<SymInt> = cli
        .dims
        .iter()
        .map(|(name, hint)| env.create_symint(name, *hint))
        .collect();
    shape.extend(cli.unbacked.iter().map(|name| env.create_unbacked_symint(name)));

    let strides = contiguous_strides(&shape);
    let count = numel(&shape);
    println!("shape:   [{}]", join(&shape));
    println!("strides: [{}]", join(&strides));
    println!("numel:   {count}");

    if !cli.guard {
        return;
    }

    let site = guard_site!();
    let resolved = materialize(&strides, site)
        .and_then(|strides| Ok((strides, count.guard_int(site)?)));
    match resolved {
        Ok((strides, count)) => {
            println!("resolved strides: {strides:?}");
            println!("resolved numel:   {count}");
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }

    for guard in env.guards() {
        println!("guard: {} == {}", guard.expr, guard.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_arguments() {
        assert_eq!(parse_dim("batch=8"), Ok(("batch".to_owned(), 8)));
        assert_eq!(parse_dim("n=0"), Ok(("n".to_owned(), 0)));
        assert!(parse_dim("batch").unwrap_err().contains("NAME=HINT"));
        assert!(parse_dim("batch=x").unwrap_err().contains("invalid hint 'x'"));
        assert!(parse_dim("batch=-1").unwrap_err().contains("not a valid size"));
        let too_big = format!("batch={}", i64::MAX);
        assert!(parse_dim(&too_big).is_err());
    }

    #[test]
    fn cli_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "symint", "--dim", "a=4", "--dim", "b=3", "--unbacked", "u0", "--guard",
        ])
        .unwrap();
        assert_eq!(cli.dims, vec![("a".to_owned(), 4), ("b".to_owned(), 3)]);
        assert_eq!(cli.unbacked, vec!["u0".to_owned()]);
        assert!(cli.guard);
    }
}
