use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use mcq_forge::clients::BankDomain;
use mcq_forge::services::GenerationRequest;
use mcq_forge::utils::logging::log_startup;
use mcq_forge::{logger, App, Config};

#[derive(Parser)]
#[command(name = "mcq-forge", about = "生成、查重、质检并上传选择题")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 调用 LLM 出题
    Generate(GenerateArgs),
    /// 解析题目文本并查重入库
    Ingest(IngestArgs),
    /// 对题目文本做质检
    Qc {
        /// 待质检的题目文本
        #[arg(default_value = "question_prompt.txt")]
        input: PathBuf,
    },
    /// 查询题库列表
    Banks {
        #[command(flatten)]
        bank: BankArgs,
        /// 按名称搜索
        #[arg(short, long)]
        search: Option<String>,
    },
    /// 上传题目到题库
    Import {
        #[command(flatten)]
        bank: BankArgs,
        /// 目标题库 ID
        #[arg(long)]
        qb_id: String,
        /// 题目 JSON 文件，默认使用入库输出
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// 检索相似题目
    Similar {
        query: String,
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// 出题主题
    #[arg(short, long)]
    topic: String,
    #[arg(short, long, default_value_t = 5)]
    count: usize,
    /// easy / medium / hard
    #[arg(short, long, default_value = "medium")]
    difficulty: String,
    /// conceptual / factual / problem-solving / scenario-based
    #[arg(long = "type", default_value = "conceptual")]
    question_type: String,
    /// 细分题型（仅 problem-solving 使用），可重复
    #[arg(long = "filter")]
    filters: Vec<String>,
    /// 出题后直接入库
    #[arg(long)]
    ingest: bool,
    /// 入库前先做质检
    #[arg(long, requires = "ingest")]
    qc: bool,
}

#[derive(Args)]
struct IngestArgs {
    /// 题目文本
    #[arg(default_value = "question_prompt.txt")]
    input: PathBuf,
    /// 期望题目数，多出的题块会被截断
    #[arg(short = 'n', long)]
    expected: Option<usize>,
    /// 入库前先做质检
    #[arg(long)]
    qc: bool,
    /// 输出 JSON 文件
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct BankArgs {
    /// lti / neowise
    #[arg(long, default_value = "lti")]
    domain: String,
    /// 题库平台的授权 token
    #[arg(long, env = "BANK_TOKEN")]
    token: String,
}

impl BankArgs {
    fn domain(&self) -> Result<BankDomain> {
        Ok(self.domain.parse::<BankDomain>()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置（命令行 --verbose 优先）
    let config = Config::from_env();
    logger::init(cli.verbose || config.verbose_logging);

    let app = App::initialize(config)?;

    match cli.command {
        Commands::Generate(args) => {
            log_startup("generate");
            let request = GenerationRequest::parse(
                &args.topic,
                args.count,
                &args.difficulty,
                &args.question_type,
                args.filters,
            )?;
            if args.ingest {
                app.generate_and_ingest(&request, args.qc).await?;
            } else {
                app.generate(&request).await?;
            }
        }
        Commands::Ingest(args) => {
            log_startup("ingest");
            app.ingest(&args.input, args.expected, args.qc, args.output.as_deref())
                .await?;
        }
        Commands::Qc { input } => {
            log_startup("qc");
            let outcome = app.qc(&input).await;
            if !outcome.success {
                bail!("质检失败: {}", outcome.report);
            }
            info!("✓ 质检完成: {}", app.config().qc_output_file);
        }
        Commands::Banks { bank, search } => {
            log_startup("banks");
            let banks = app
                .banks(bank.domain()?, &bank.token, search.as_deref())
                .await?;
            info!("共 {} 个题库", banks.len());
        }
        Commands::Import { bank, qb_id, file } => {
            log_startup("import");
            app.import(bank.domain()?, &bank.token, &qb_id, file.as_deref())
                .await?;
        }
        Commands::Similar { query, k } => {
            log_startup("similar");
            let results = app.similar(&query, k).await?;
            info!("找到 {} 道相似题目", results.len());
        }
    }

    Ok(())
}
