// ==========================================
// 门店库存同步系统 - 命令行入口
// ==========================================
// 职责: 无界面运行会话（导入/分类/同步/排除清单/历史回看）
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use inventory_sync::config::{default_config_path, AppConfig};
use inventory_sync::db::ConnectionFactory;
use inventory_sync::engine::{ArticleRelay, EngineResult, ExclusionRegistry};
use inventory_sync::{logging, InventorySession, LabelGranularity, SyncAnchor, SyncEvent};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inventory-sync", version, about = "门店库存快照同步工具")]
struct Cli {
    /// 配置文件路径（JSON）
    #[arg(long, global = true, env = "INVENTORY_SYNC_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// 覆盖配置中的数据库路径
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 初始化数据库 schema
    InitDb,
    /// 导入表格、分类并同步
    Scan(ScanArgs),
    /// 排除清单维护
    #[command(subcommand)]
    Exclude(ExcludeCommand),
    /// 查看某货号的历史库存
    History(HistoryArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// 表格文件（.xlsx/.xls/.csv），按顺序合并
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// 同步锚点日期（默认今天）
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,

    /// 只分类，不做交互式同步（退出时仍会静默同步）
    #[arg(long)]
    no_sync: bool,

    /// 将分类结果逐条输出到标准输出（模拟外部录入）
    #[arg(long, value_enum)]
    relay: Option<RelayTarget>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RelayTarget {
    Zeros,
    Lows,
}

#[derive(Subcommand)]
enum ExcludeCommand {
    /// 加入排除清单
    Add { article: String },
    /// 从排除清单移除
    Remove { article: String },
    /// 列出当前激活的货号
    List,
    /// 从旧版本地数据库迁移
    ImportLegacy {
        #[arg(value_name = "SQLITE_FILE")]
        path: PathBuf,
    },
}

#[derive(Args)]
struct HistoryArgs {
    article: String,
    /// 起始周（无法解析时为 0）
    #[arg(long, default_value = "")]
    start: String,
    /// 结束周（无法解析时为当前周）
    #[arg(long, default_value = "")]
    end: String,
}

/// 将货号写到标准输出的转发端
struct StdoutRelay;

impl ArticleRelay for StdoutRelay {
    fn submit(&mut self, article: &str) -> EngineResult<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", article).map_err(|e| inventory_sync::EngineError::Relay {
            article: article.to_string(),
            message: e.to_string(),
        })
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config =
        AppConfig::load(&path).with_context(|| format!("加载配置失败: {}", path.display()))?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing::info!(version = inventory_sync::VERSION, db_path = %config.db_path, "{}", inventory_sync::APP_NAME);

    match cli.command {
        Command::InitDb => {
            ConnectionFactory::new(config.db_path.clone()).bootstrap()?;
            println!("数据库已就绪: {}", config.db_path);
        }
        Command::Scan(args) => run_scan(config, args).await?,
        Command::Exclude(cmd) => run_exclude(config, cmd)?,
        Command::History(args) => run_history(config, args)?,
    }
    Ok(())
}

async fn run_scan(config: AppConfig, args: ScanArgs) -> Result<()> {
    let anchor = SyncAnchor::from_date(args.date.unwrap_or_else(|| Local::now().date_naive()));
    let mut session = InventorySession::open(config)?;

    // 扫描阶段出错也要走退出前同步，错误在同步之后返回
    let outcome = scan_session(&mut session, &args, anchor).await;
    if let Err(e) = &outcome {
        tracing::error!(error = %e, "扫描流程中断，继续执行退出前同步");
    }

    match session.shutdown(anchor).await {
        Ok(Some(report)) => eprintln!("退出前已静默同步 {} 行", report.processed),
        Ok(None) => {}
        Err(e) if outcome.is_err() => tracing::error!(error = %e, "退出前同步失败"),
        Err(e) => return Err(e.into()),
    }
    outcome
}

async fn scan_session(
    session: &mut InventorySession,
    args: &ScanArgs,
    anchor: SyncAnchor,
) -> Result<()> {
    for file in &args.files {
        let summary = session
            .ingest_file(file)
            .with_context(|| format!("导入失败: {}", file.display()))?;
        println!(
            "{}: {} 行，丢弃 {}，新增 {}，覆盖 {}",
            file.display(),
            summary.received,
            summary.dropped_banned,
            summary.added,
            summary.replaced
        );
    }

    for light in session.department_lights() {
        println!("[{}] {}", if light.observed { "x" } else { " " }, light.group);
    }

    let zeros = session.find_zeros()?.len();
    let lows = session.find_lows()?.len();
    println!("零库存 {} 个，低库存 {} 个", zeros, lows);

    if !args.no_sync {
        if let Some(handle) = session.start_sync(anchor)? {
            let (mut events, task) = handle.into_parts();
            while let Some(event) = events.recv().await {
                match event {
                    SyncEvent::Progress { processed, total } => {
                        eprint!("\r同步进度 {}/{}", processed, total)
                    }
                    SyncEvent::ProductDiscovered { description } => {
                        eprintln!("\r新商品: {}", description)
                    }
                    SyncEvent::Error { message } => eprintln!("\r同步失败: {}", message),
                    SyncEvent::Complete { report } => eprintln!(
                        "\r同步完成: 写入 {}，跳过 {}，新商品 {}",
                        report.processed, report.skipped, report.discovered
                    ),
                }
            }
            task.await.context("同步任务异常退出")??;
        }
    }

    if let Some(target) = args.relay {
        let mut relay = StdoutRelay;
        let sent = match target {
            RelayTarget::Zeros => session.dispatch_zeros(&mut relay)?,
            RelayTarget::Lows => session.dispatch_lows(&mut relay)?,
        };
        eprintln!("已转发 {} 个货号", sent);
    }
    Ok(())
}

fn run_exclude(config: AppConfig, cmd: ExcludeCommand) -> Result<()> {
    let connections = ConnectionFactory::new(config.db_path.clone());
    connections.bootstrap()?;
    let registry = ExclusionRegistry::new(connections);

    match cmd {
        ExcludeCommand::Add { article } => {
            println!("{}", registry.activate(&article)?);
        }
        ExcludeCommand::Remove { article } => {
            println!("{}", registry.deactivate(&article)?);
        }
        ExcludeCommand::List => {
            for article in registry.list_active()? {
                println!("{}", article);
            }
        }
        ExcludeCommand::ImportLegacy { path } => {
            if !path.exists() {
                bail!("旧版数据库不存在: {}", path.display());
            }
            let inserted = registry.import_legacy(&path)?;
            println!("新增 {} 个货号", inserted);
        }
    }
    Ok(())
}

fn run_history(config: AppConfig, args: HistoryArgs) -> Result<()> {
    let session = InventorySession::open(config)?;
    let today = Local::now().date_naive();
    let series = session.history_from_input(&args.article, &args.start, &args.end, today)?;

    println!(
        "{} {}",
        series.article_number,
        series.description.as_deref().unwrap_or("")
    );
    if series.is_empty() {
        println!("（无记录）");
        return Ok(());
    }

    let label = match series.label_granularity() {
        LabelGranularity::Daily => "%m-%d",
        LabelGranularity::Weekly => "%G-W%V",
    };
    for point in &series.points {
        println!("{}\t{}", point.date.format(label), point.quantity);
    }
    Ok(())
}
