use std::io::Read;

use clap::Parser;

use husk::{IoContainer, Shell};

#[derive(Parser)]
#[command(name = "husk")]
#[command(about = "A small POSIX shell interpreter")]
#[command(version)]
struct Cli {
    /// Execute the script given on the command line
    #[arg(short = 'c')]
    script: Option<String>,

    /// Output results as JSON (stdout, stderr, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Script source: -c, a file, or stdin.
    let source = if let Some(script) = cli.script {
        script
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(contents) => contents,
            Err(e) => {
                eprintln!("husk: cannot read script file {file}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("husk: no script provided; use -c 'script', a script file, or pipe via stdin");
            std::process::exit(1);
        }
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("husk: cannot read stdin: {e}");
            std::process::exit(1);
        }
        buf
    };

    let mut shell = Shell::new();

    if cli.json {
        let result = shell.exec(&source);
        println!(
            "{}",
            serde_json::json!({
                "stdout": result.stdout,
                "stderr": result.stderr,
                "exitCode": result.status.code(),
            })
        );
        std::process::exit(result.status.code());
    }

    let status = shell.run(&source, &mut IoContainer::inherited());
    std::process::exit(status.code());
}
