//! Components command - prints every registered descriptor

use crate::infrastructure::init_global_registry;

use super::workspace::print_json;

pub fn run() -> anyhow::Result<()> {
    super::bootstrap();

    let registry = init_global_registry()?;
    print_json(&registry.list_available())
}
