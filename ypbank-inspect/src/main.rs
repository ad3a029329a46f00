//! CLI-утилита для просмотра банковских выписок MT940.

use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use tracing_subscriber::EnvFilter;
use ypbank_mt940::{Error, Mt940Parser, ParserConfig, Statement, Transaction};

/// Формат вывода.
#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Читаемый отчет
    #[default]
    Text,
    /// CSV, одна строка на транзакцию
    Csv,
}

/// YPBank Inspect - разбор выписок MT940 с учетом банковского диалекта.
///
/// Определяет банк по документу, собирает выписки и печатает транзакции
/// с контрагентами и назначением платежа.
#[derive(Parser)]
#[command(name = "ypbank-inspect")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Входной файл (по умолчанию stdin)
    #[arg(long, short)]
    input: Option<String>,

    /// Выходной файл (по умолчанию stdout)
    #[arg(long, short)]
    output: Option<String>,

    /// Формат вывода
    #[arg(long, short, value_enum, default_value_t)]
    format: OutputFormat,

    /// Прерывать разбор на первой некорректной дате или сумме
    #[arg(long)]
    strict: bool,

    /// Подробный вывод
    #[arg(short, long)]
    verbose: bool,
}

fn read_input(args: &Args) -> Result<String, String> {
    let mut content = String::new();

    if let Some(ref path) = args.input {
        let mut file =
            File::open(path).map_err(|e| format!("Не удалось открыть файл '{}': {}", path, e))?;
        file.read_to_string(&mut content)
            .map_err(|e| format!("Не удалось прочитать файл '{}': {}", path, e))?;
    } else {
        io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| format!("Не удалось прочитать stdin: {}", e))?;
    }

    Ok(content)
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn format_transaction(tx: &Transaction) -> String {
    let sign = if tx.is_credit() { "+" } else { "-" };
    let date = tx
        .book_date
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    let description = tx.description.replace('\n', " ");
    let description = if description.chars().count() > 50 {
        format!("{}...", description.chars().take(47).collect::<String>())
    } else {
        description
    };

    format!(
        "{} {} {} {} | {} | {}",
        date,
        sign,
        tx.amount.abs(),
        tx.credit_debit.code(),
        or_dash(tx.counterparty_name.as_deref()),
        description
    )
}

fn write_text<W: Write>(
    statements: &[Statement],
    verbose: bool,
    writer: &mut W,
) -> io::Result<()> {
    for statement in statements {
        writeln!(writer, "=== Выписка {} ===", or_dash(statement.reference.as_deref()))?;
        writeln!(writer, "Счет: {}", statement.account)?;
        writeln!(writer, "Номер: {}", or_dash(statement.statement_number.as_deref()))?;
        writeln!(writer, "Валюта: {}", or_dash(statement.currency.as_deref()))?;
        if let Some(balance) = &statement.opening_balance {
            writeln!(writer, "Входящий остаток: {} на {}", balance.amount, balance.date)?;
        }
        if let Some(balance) = &statement.closing_balance {
            writeln!(writer, "Исходящий остаток: {} на {}", balance.amount, balance.date)?;
        }
        writeln!(writer, "Транзакций: {}", statement.transactions.len())?;
        writeln!(writer)?;

        for tx in &statement.transactions {
            writeln!(writer, "{}", format_transaction(tx))?;
            if verbose {
                let value_date = tx.value_date.map(|d| d.to_string());
                writeln!(writer, "    Валютирование: {}", or_dash(value_date.as_deref()))?;
                writeln!(writer, "    Тип: {}", tx.transaction_type)?;
                writeln!(writer, "    Референс: {}", tx.reference)?;
                writeln!(
                    writer,
                    "    End-to-end: {}",
                    or_dash(tx.end_to_end_reference.as_deref())
                )?;
                writeln!(
                    writer,
                    "    Контрагент: {} {}",
                    or_dash(tx.counterparty_account.as_deref()),
                    or_dash(tx.counterparty_bic.as_deref())
                )?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\"").replace('\n', " "))
}

fn write_csv<W: Write>(statements: &[Statement], writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        "Счет,Дата проводки,Дата валютирования,Сумма,Признак,Тип,Референс,Счет контрагента,BIC,Контрагент,Описание"
    )?;

    for statement in statements {
        for tx in &statement.transactions {
            let book_date = tx.book_date.map(|d| d.to_string()).unwrap_or_default();
            let value_date = tx.value_date.map(|d| d.to_string()).unwrap_or_default();
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{},{},{}",
                csv_field(&statement.account),
                book_date,
                value_date,
                tx.amount,
                tx.credit_debit.code(),
                csv_field(&tx.transaction_type),
                csv_field(&tx.reference),
                csv_field(tx.counterparty_account.as_deref().unwrap_or("")),
                csv_field(tx.counterparty_bic.as_deref().unwrap_or("")),
                csv_field(tx.counterparty_name.as_deref().unwrap_or("")),
                csv_field(&tx.description)
            )?;
        }
    }
    Ok(())
}

fn write_report<W: Write>(statements: &[Statement], args: &Args, writer: &mut W) -> io::Result<()> {
    match args.format {
        OutputFormat::Text => write_text(statements, args.verbose, writer),
        OutputFormat::Csv => write_csv(statements, writer),
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let content = match read_input(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Ошибка: {}", e);
            process::exit(1);
        }
    };

    let config = if args.strict {
        ParserConfig::strict()
    } else {
        ParserConfig::default()
    };
    let parser = Mt940Parser::with_config(config);

    // При нарушении структуры или прерванной выписке печатаем то, что успели собрать.
    let (statements, failure) = match parser.parse(&content) {
        Ok(statements) => (statements, None),
        Err(e @ (Error::MalformedStatementStructure { .. } | Error::StatementAborted { .. })) => {
            (e.completed_statements().to_vec(), Some(e))
        }
        Err(e) => {
            eprintln!("Ошибка: {}", e);
            process::exit(1);
        }
    };

    let result = if let Some(ref path) = args.output {
        let mut file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Ошибка: Не удалось создать файл '{}': {}", path, e);
                process::exit(1);
            }
        };
        write_report(&statements, &args, &mut file)
    } else {
        let mut stdout = io::stdout();
        write_report(&statements, &args, &mut stdout)
    };

    if let Err(e) = result {
        eprintln!("Ошибка записи: {}", e);
        process::exit(1);
    }

    if let Some(e) = failure {
        eprintln!("Ошибка: {}", e);
        process::exit(1);
    }
}
