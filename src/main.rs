use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let ok = barang_console_lib::run()?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
