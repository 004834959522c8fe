//! Export TypeScript definitions for the JSON produced by `lsn-fetch`.

use ts_rs::TS;

use lsn_client::{HierarchyLevel, Region, TableResult, TableRow};

fn export<T: TS + 'static>() -> bool {
    match T::export() {
        Ok(()) => {
            println!("exported {}", T::name());
            true
        }
        Err(e) => {
            eprintln!("{} export error: {}", T::name(), e);
            false
        }
    }
}

fn main() -> std::process::ExitCode {
    let results = [
        export::<Region>(),
        export::<HierarchyLevel>(),
        export::<TableRow>(),
        export::<TableResult>(),
    ];

    if results.iter().all(|ok| *ok) {
        std::process::ExitCode::SUCCESS
    } else {
        std::process::ExitCode::FAILURE
    }
}
