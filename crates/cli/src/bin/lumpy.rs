use anyhow::Result;

fn main() -> Result<()> {
    lumpy_cli::main_entry()
}
