use std::collections::hash_map::DefaultHasher;
use std::hash::BuildHasherDefault;

use clap::Parser;
use cuckoo_table::MatrixFamilyBuilder;
use cuckoo_table::Table;

type DemoTable = Table<u64, u64, BuildHasherDefault<DefaultHasher>, MatrixFamilyBuilder>;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(short = 't', long = "tables", default_value_t = 2)]
    tables: usize,

    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,

    /// Keep growing and insert this many values instead of stopping at the
    /// first value that does not fit.
    #[arg(short = 'n', long = "count")]
    count: Option<u64>,
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating Table with target capacity {} and {} subtables",
        args.target_capacity, args.tables
    );

    let mut table = match DemoTable::try_with_hashers(
        args.target_capacity,
        args.tables,
        BuildHasherDefault::default(),
        MatrixFamilyBuilder::with_seed(args.seed),
    ) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    println!("Actual capacity: {}", table.capacity());

    match args.count {
        Some(count) => {
            println!("Inserting {count} u64 values...");
            let mut grows = 0;
            let mut capacity = table.capacity();
            for value in 0..count {
                table.insert(value, value);
                if table.capacity() != capacity {
                    grows += 1;
                    capacity = table.capacity();
                }
            }
            println!("Table grew {grows} times");
        }
        None => {
            println!("Filling table without growing...");
            table.set_max_capacity(Some(table.capacity()));
            let mut value = 0u64;
            loop {
                if let Err(err) = table.try_insert(value, value) {
                    println!("Value {} left without a slot: {}", err.key, err.error);
                    break;
                }
                value += 1;
            }
        }
    }

    println!("Inserted {} values into table", table.len());
    println!("Final load factor: {:.2}%", table.load_factor() * 100.0);

    table.debug_stats().print();
}
