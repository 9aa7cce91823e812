mod session;

use std::env;
use std::io;
use std::process;

use session::{MemoryProfile, Session};

fn main() -> io::Result<()> {
    let profile = parse_profile().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: camera-emulator [--profile] [standard|extended]");
        process::exit(2);
    });

    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(profile)?.run(&mut stdin.lock(), &mut stdout.lock())
}

fn parse_profile() -> Result<MemoryProfile, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(MemoryProfile::Standard),
        [tag] => match tag.strip_prefix("--profile=") {
            Some(value) => MemoryProfile::from_tag(value),
            None => MemoryProfile::from_tag(tag),
        },
        [flag, value] if flag.as_str() == "--profile" => MemoryProfile::from_tag(value),
        _ => Err("Expected at most one profile argument".to_string()),
    }
}
