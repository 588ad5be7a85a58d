use std::env;
use std::io;
use std::io::Write;
use std::process;

use lfg::{Err, Grammar};

fn usage(prog_name: &str) -> String {
  format!(
    r"
Usage: {} FILE [options]

Options:
  -h, --help    Print this message
  -c, --chart   Print the parse chart (defaults to not printing)
  -t, --trees   Print c-structure trees (defaults to not printing)",
    prog_name
  )
}

fn parse(g: &Grammar, sentence: &str, print_chart: bool, print_trees: bool) -> Result<(), Err> {
  let sentence = sentence.split(' ').collect::<Vec<_>>();

  if print_chart {
    println!("chart:\n{}\n", g.parse_chart(&sentence));
  }

  let analyses = g.analyses(&sentence);

  println!(
    "Parsed {} analysis{}",
    analyses.len(),
    if analyses.len() == 1 { "" } else { "es" }
  );

  for (tree, fs) in analyses {
    if print_trees {
      println!("{}", tree);
    }
    println!("{}", fs);
    println!();
  }

  Ok(())
}

fn main() -> Result<(), Err> {
  let opts: Vec<String> = env::args().collect();
  let prog_name = opts[0].clone();

  if opts.len() < 2 {
    println!("{}", usage(&prog_name));
    process::exit(1);
  }

  let mut opts = opts.into_iter().skip(1);
  let filename = opts.next().unwrap();

  let mut print_chart = false;
  let mut print_trees = false;
  for o in opts {
    if o == "-h" || o == "--help" {
      println!("{}", usage(&prog_name));
      process::exit(0);
    } else if o == "-c" || o == "--chart" {
      print_chart = true;
    } else if o == "-t" || o == "--trees" {
      print_trees = true;
    }
  }

  let g = Grammar::read_from_file(&filename)?;

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        input.make_ascii_lowercase();
        parse(&g, input.trim(), print_chart, print_trees)?;
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
