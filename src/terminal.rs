//! Line-oriented terminal front-end.

use anyhow::{Context, Result};
use std::path::Path;
use strictly_othello::{
    AutoSaver, ClientConfig, GameSettings, MoveService, NodeId, Phase, SaveStore,
    SessionController, SessionView, Snapshot, Square,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};

const HELP: &str = "\
Commands:
  d3              play a square
  undo            step back to your previous decision
  jump <id>       go to any explored position (see 'line' and 'tree')
  resume          continue play (opponent move or forced pass)
  cancel          stop waiting for the opponent
  line            positions from the start to here
  tree            continuations from here
  save <name>     store the session under a name
  load <name>     restore a named save
  saves           list named saves
  export <file>   write an analysis file
  import <file>   load an analysis file
  record <file>   write the main line as a linear record
  new             start over with the same settings
  help            show this help
  quit            leave (the session is autosaved)";

enum Flow {
    Continue,
    Quit,
}

/// Runs the interactive session until the user quits or stdin closes.
#[instrument(skip(service, store, config, settings))]
pub async fn run<S: MoveService>(
    service: S,
    store: SaveStore,
    config: &ClientConfig,
    settings: GameSettings,
    resume: bool,
) -> Result<()> {
    let saver = AutoSaver::new(store.clone(), config.autosave_debounce());
    let (controller, mut replies) = SessionController::new(std::sync::Arc::new(service));
    let mut controller = controller.with_autosave(saver);

    let restored = if resume {
        match controller.restore_autosave().await {
            Ok(restored) => restored,
            Err(e) => {
                println!("Could not restore the autosave: {e}");
                false
            }
        }
    } else {
        false
    };
    if !restored {
        controller
            .start_game(settings)
            .await
            .context("Failed to start a game")?;
    }
    println!("{HELP}\n");
    render(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle(&mut controller, &store, line.trim()).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => println!("Error: {e}"),
                }
            }
            Some(reply) = replies.recv() => {
                match controller.on_opponent_reply(reply).await {
                    Ok(true) => render(&controller),
                    Ok(false) => {}
                    Err(e) => println!("Opponent move failed: {e}\nType 'resume' to try again."),
                }
            }
        }
    }

    controller.cancel_opponent();
    controller.flush_autosave().await;
    info!("Session closed");
    Ok(())
}

async fn handle<S: MoveService>(
    controller: &mut SessionController<S>,
    store: &SaveStore,
    input: &str,
) -> Result<Flow> {
    let (command, argument) = match input.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (input, ""),
    };

    match command {
        "" => {}
        "quit" | "exit" => return Ok(Flow::Quit),
        "help" => println!("{HELP}"),
        "undo" => {
            if controller.undo().await? {
                render(controller);
            } else {
                println!("Nothing to undo.");
            }
        }
        "jump" => {
            let target: NodeId = argument
                .parse()
                .with_context(|| format!("'{argument}' is not a position id"))?;
            controller.jump_to(target).await?;
            render(controller);
        }
        "resume" => {
            if controller.resume().await? {
                render(controller);
            } else {
                println!("Nothing to resume.");
            }
        }
        "cancel" => {
            if controller.cancel_opponent() {
                println!("Stopped waiting for the opponent. Type 'resume' to ask again.");
            }
        }
        "line" => print_line(controller)?,
        "tree" => {
            for (id, mv) in controller.continuations(controller.current())? {
                println!("  [{id}] {mv}");
            }
        }
        "save" => {
            let snapshot = controller.snapshot().context("No game to save")?;
            store.save_named(argument, &snapshot)?;
            println!("Saved as '{argument}'.");
        }
        "load" => {
            let payload = store
                .load_named(argument)?
                .with_context(|| format!("No save named '{argument}'"))?;
            controller.restore(Snapshot::parse(&payload)?).await?;
            render(controller);
        }
        "saves" => print_saves(store)?,
        "export" => {
            let snapshot = controller.snapshot().context("No game to export")?;
            write_file(argument, &snapshot.to_json()?)?;
            println!("Analysis written to {argument}.");
        }
        "import" => {
            let text = std::fs::read_to_string(argument)
                .with_context(|| format!("Failed to read {argument}"))?;
            controller.restore(Snapshot::parse(&text)?).await?;
            render(controller);
        }
        "record" => {
            let record = controller.linear_record().context("No game to record")?;
            write_file(argument, &record.to_notation())?;
            println!("Record written to {argument}.");
        }
        "new" => {
            let settings = *controller.settings();
            controller.start_game(settings).await?;
            render(controller);
        }
        other => match other.parse::<Square>() {
            Ok(square) => {
                if controller.click(square).await? {
                    render(controller);
                } else {
                    println!("{square} is not playable right now.");
                }
            }
            Err(_) => println!("Unknown command '{other}'. Type 'help'."),
        },
    }
    Ok(Flow::Continue)
}

fn write_file(path: &str, contents: &str) -> Result<()> {
    if path.is_empty() {
        anyhow::bail!("A file name is required");
    }
    std::fs::write(Path::new(path), contents).with_context(|| format!("Failed to write {path}"))
}

/// Lists named saves, most recent first.
pub fn print_saves(store: &SaveStore) -> Result<()> {
    let saves = store.list_saves()?;
    if saves.is_empty() {
        println!("No saves.");
    }
    for save in saves {
        println!(
            "  {:<20} {}  {:<15} {:<9} {} moves",
            save.label(),
            save.saved_at().format("%Y-%m-%d %H:%M"),
            save.mode(),
            save.phase(),
            save.move_count()
        );
    }
    Ok(())
}

fn print_line<S: MoveService>(controller: &SessionController<S>) -> Result<()> {
    for node in controller.tree().path_to_root(controller.current())? {
        let label = node
            .mv()
            .map_or_else(|| "start".to_string(), |mv| mv.to_string());
        let branches = node.variations().len();
        if branches > 0 {
            println!("  [{}] {label}  (+{branches} variations)", node.id());
        } else {
            println!("  [{}] {label}", node.id());
        }
    }
    Ok(())
}

fn render<S: MoveService>(controller: &SessionController<S>) {
    let Some(view) = controller.view() else {
        warn!("Nothing to render before a game starts");
        return;
    };
    print!("{}", view.board.display(&view.legal_moves));
    println!("{}  |  position {}  |  move {}", view.score, view.current, view.moves_played);
    if let Some(mv) = view.last_move {
        println!("Last: {mv}");
    }
    println!("{}", status_line(&view));
}

fn status_line(view: &SessionView) -> String {
    match (view.phase, view.result, view.to_move) {
        (Phase::GameOver, Some(result), _) => format!("Game over: {}", result.summary()),
        (_, _, Some(player)) if view.opponent_thinking => format!("{player} (AI) is thinking..."),
        (_, _, Some(player)) if view.awaiting_resume && view.legal_moves.is_empty() => {
            format!("{player} has no moves and must pass. Type 'resume'.")
        }
        (_, _, Some(player)) if view.awaiting_resume => {
            format!("{player} (AI) to move. Type 'resume' to let it play.")
        }
        (_, _, Some(player)) => format!("{player} to move"),
        _ => String::new(),
    }
}
