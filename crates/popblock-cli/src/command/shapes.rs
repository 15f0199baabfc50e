use popblock_engine::{ShapeCatalog, ShapeDefinition};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShapesArg {
    /// Print the rotation states next to each other instead of stacked
    #[arg(long)]
    wide: bool,
}

pub(crate) fn run(arg: &ShapesArg) {
    let ShapesArg { wide } = arg;
    for definition in ShapeCatalog::definitions() {
        println!(
            "{} ({:?}, '{}')",
            definition.kind().as_char(),
            definition.color(),
            definition.color().code()
        );
        if *wide {
            print_wide(definition);
        } else {
            for (i, matrix) in definition.rotations().iter().enumerate() {
                println!("rotation {i}:");
                println!("{matrix}");
            }
        }
        println!();
    }
}

fn print_wide(definition: &ShapeDefinition) {
    let rotations = definition.rotations();
    let height = rotations.iter().map(|m| m.rows()).max().unwrap_or(0);
    for y in 0..height {
        let line = rotations
            .iter()
            .map(|matrix| {
                (0..4)
                    .map(|x| if matrix.is_occupied(x, y) { '#' } else { '.' })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line.trim_end());
    }
}
