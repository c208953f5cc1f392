// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn month_arg() -> Arg {
    Arg::new("month")
        .long("month")
        .short('m')
        .help("Month as YYYY-MM (defaults to the current month)")
}

fn tx_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(
        Arg::new("description")
            .long("description")
            .short('d')
            .required(required),
    )
    .arg(
        Arg::new("amount")
            .long("amount")
            .short('a')
            .allow_hyphen_values(true)
            .required(required),
    )
    .arg(
        Arg::new("type")
            .long("type")
            .short('t')
            .help("income|expense (entrada|saida)"),
    )
    .arg(Arg::new("category").long("category").short('c'))
    .arg(Arg::new("date").long("date").help("YYYY-MM-DD[THH:MM:SS] or DD/MM/YYYY"))
    .arg(
        Arg::new("spending")
            .long("spending")
            .help("Renda|Necessidades|Desejos"),
    )
    .arg(
        Arg::new("payment")
            .long("payment")
            .help("Dinheiro|Pix|Crédito|Débito"),
    )
}

pub fn build_cli() -> Command {
    Command::new("genio")
        .about("Gênio Financeiro: income/expense tracking, reports, simulated Open Finance and AI advice")
        .version(clap::crate_version!())
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .help("Username whose data is in scope (default: local owner)"),
        )
        .subcommand(
            Command::new("init")
                .about("Initialize the database")
                .arg(
                    Arg::new("demo")
                        .long("demo")
                        .action(ArgAction::SetTrue)
                        .help("Seed starter transactions when the owner has none"),
                ),
        )
        .subcommand(
            Command::new("user")
                .about("Manage user profiles")
                .subcommand(
                    Command::new("register")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("phone").long("phone").required(true))
                        .arg(Arg::new("username").long("username").required(true))
                        .arg(Arg::new("password").long("password").required(true))
                        .arg(Arg::new("admin").long("admin").action(ArgAction::SetTrue)),
                )
                .subcommand(json_flags(Command::new("list").about("Admin panel: all profiles")))
                .subcommand(
                    Command::new("show").arg(Arg::new("username").long("username").required(true)),
                )
                .subcommand(
                    Command::new("passwd")
                        .arg(Arg::new("username").long("username").required(true))
                        .arg(Arg::new("password").long("password").required(true)),
                )
                .subcommand(
                    Command::new("delete")
                        .arg(Arg::new("username").long("username").required(true)),
                )
                .subcommand(
                    Command::new("recover")
                        .about("Print the WhatsApp password recovery link")
                        .arg(Arg::new("username").long("username").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(tx_fields(Command::new("add"), true).arg(month_arg()))
                .subcommand(json_flags(
                    Command::new("list").arg(month_arg()).arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize)),
                    ),
                ))
                .subcommand(
                    tx_fields(Command::new("edit"), false).arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("carry")
                        .about("Copy the previous month's entries into --month")
                        .arg(month_arg()),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Monthly reports")
                .subcommand(json_flags(Command::new("summary").arg(month_arg())))
                .subcommand(json_flags(
                    Command::new("breakdown").arg(month_arg()).arg(
                        Arg::new("by")
                            .long("by")
                            .default_value("category")
                            .help("category|payment|spending"),
                    ),
                ))
                .subcommand(json_flags(Command::new("dashboard").arg(month_arg())))
                .subcommand(json_flags(
                    Command::new("history").arg(month_arg()).arg(
                        Arg::new("count")
                            .long("count")
                            .default_value("7")
                            .value_parser(value_parser!(usize)),
                    ),
                )),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("csv")
                    .arg(month_arg())
                    .arg(Arg::new("out").long("out").short('o')),
            ),
        )
        .subcommand(
            Command::new("import")
                .subcommand(Command::new("csv").arg(Arg::new("path").long("path").required(true)))
                .subcommand(
                    Command::new("legacy")
                        .about("Import the old browser-storage JSON blob")
                        .arg(Arg::new("path").long("path").required(true)),
                ),
        )
        .subcommand(
            Command::new("bank")
                .about("Simulated Open Finance connections")
                .subcommand(Command::new("institutions"))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("connect")
                        .arg(Arg::new("institution").long("institution").required(true))
                        .arg(Arg::new("cpf").long("cpf").required(true))
                        .arg(
                            Arg::new("no_wait")
                                .long("no-wait")
                                .action(ArgAction::SetTrue)
                                .help("Skip the simulated redirect/authentication delays"),
                        )
                        .arg(
                            Arg::new("offline")
                                .long("offline")
                                .action(ArgAction::SetTrue)
                                .help("Parse the statement locally instead of with the AI model"),
                        ),
                )
                .subcommand(
                    Command::new("sync")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("offline").long("offline").action(ArgAction::SetTrue)),
                ),
        )
        .subcommand(
            Command::new("advice")
                .about("Ask the AI assistant for tips on a month")
                .arg(month_arg()),
        )
        .subcommand(
            Command::new("config")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                )
                .subcommand(Command::new("get").arg(Arg::new("key").long("key").required(true)))
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("doctor").about("Check stored data for inconsistencies"))
}
