mod cli;

use stackplan::backend::PreviewBackend;
use stackplan::deploy::DeploymentDriver;
use stackplan::documents::StackDocuments;
use stackplan::stack::Stack;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("STACKPLAN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Plan(plan_cli) => plan(plan_cli),
        cli::Command::Preview(preview_cli) => preview(preview_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn plan(cli: cli::PlanCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;
    let stack = Stack::new(&documents)?;
    let plan = stack.plan()?;

    output(&cli.output, &plan)?;
    Ok(())
}

pub fn preview(cli: cli::PreviewCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;
    let stack = Stack::new(&documents)?;
    let plan = stack.plan()?;

    let overrides = cli.variables.into_iter().collect();
    let variables = stack.variables_with(&overrides);

    let mut backend = PreviewBackend::default();
    let mut driver = DeploymentDriver::new(&mut backend, &variables);
    driver.deploy(&plan)?;
    let outputs = driver.outputs().clone();

    #[derive(serde::Serialize)]
    struct Preview {
        calls: Vec<stackplan::backend::PreviewCall>,
        outputs: stackplan::store::OutputStore,
    }

    output(
        &cli.output,
        &Preview {
            calls: backend.into_calls(),
            outputs,
        },
    )?;
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<StackDocuments> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let stack = stackplan::documents::parse_yaml(&stdin)?;
        return Ok(stack.into());
    }

    let mut documents = StackDocuments::default();

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        documents.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

fn output<T: serde::Serialize>(output: &cli::OutputArgs, value: &T) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

/// (stackplan-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;

    match cli.command {
        cli::DevSubCommand::Documents => println!("{documents:#?}"),
        cli::DevSubCommand::Stack => {
            let stack = Stack::new(&documents)?;
            println!("{stack:#?}")
        }
    }

    Ok(())
}
