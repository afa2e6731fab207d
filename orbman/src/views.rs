use comfy_table::{Cell, Color, ContentArrangement, Table};
use orbman_distro::Catalog;
use orbman_machine::MachineRecord;

pub fn print_machines<'a>(machines: impl Iterator<Item = &'a MachineRecord>, with_index: bool) {
    let machines: Vec<_> = machines.collect();
    if machines.is_empty() {
        println!("No machines to show");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec!["Name", "Distro", "State"];
    if with_index {
        header.push("Index");
    }
    table.set_header(header);

    for (index, machine) in machines.iter().enumerate() {
        let state_color = if machine.state.is_running() {
            Color::Green
        } else {
            Color::Red
        };
        let mut row = vec![
            Cell::new(&machine.name),
            Cell::new(distro_label(machine)),
            Cell::new(machine.state.to_string()).fg(state_color),
        ];
        if with_index {
            row.push(Cell::new((index + 1).to_string()));
        }
        table.add_row(row);
    }

    println!("{table}");
}

pub fn print_distros(catalog: &Catalog) {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Distribution", "Versions"]);

    for (id, versions) in catalog.iter() {
        table.add_row(vec![id.to_owned(), versions.join(", ")]);
    }

    println!("{table}");
}

fn distro_label(machine: &MachineRecord) -> String {
    let label = [&machine.distro, &machine.version, &machine.arch]
        .iter()
        .filter_map(|part| part.as_deref())
        .collect::<Vec<_>>()
        .join(":");
    if label.is_empty() {
        "-".to_owned()
    } else {
        label
    }
}
