use nexshell::Interpreter;

fn main() -> anyhow::Result<()> {
    Interpreter::default().repl()
}
