mod analyzer;
mod canonicalizer;
mod extractor;
mod loader;
mod models;

use analyzer::{CohortAnalysis, StudentAnalysis};
use anyhow::Result;
use canonicalizer::{GradeStatus, Lexicon};
use clap::{Arg, Command};
use models::Config;
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    let matches = Command::new("grade-analyzer")
        .version("1.0")
        .about("Analyzes UK student grade tracker submissions")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Spreadsheet to analyze (overrides the config)"),
        )
        .get_matches();

    let config_file = matches.get_one::<String>("config").unwrap();

    // Load or create configuration
    let mut config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        default_config
    };

    if let Some(input) = matches.get_one::<String>("input") {
        config.input_file = input.clone();
    }

    if !Path::new(&config.input_file).exists() {
        println!("❌ Error: input file not found: {}", config.input_file);
        println!(
            "   Please edit {} and set input_file, or pass --input",
            config_file
        );
        return Ok(());
    }

    let output_dir = config.output_directory.as_deref().unwrap_or("output");

    // Create output directory if it doesn't exist
    fs::create_dir_all(output_dir)?;

    // Clean up previous results
    clean_output_directory(output_dir)?;

    println!("🔍 Analyzing grade tracker data from: {}", config.input_file);
    println!("📄 Output directory: {} (cleaned)", output_dir);

    let records = loader::load_records(Path::new(&config.input_file), &config.sheet_name)?;
    println!("   ✅ Loaded {} student rows", records.len());

    if records.is_empty() {
        println!("❌ No student rows found in {}", config.input_file);
        return Ok(());
    }

    let lexicon = Lexicon::new();
    let analyzer = analyzer::GradeAnalyzer::new(&lexicon);
    let analysis = analyzer.analyze_all(&records);
    println!(
        "   ✅ Analyzed {} students ({} with grade data)",
        analysis.students.len(),
        analysis.students_with_data
    );

    generate_html_report(&analysis, output_dir)?;
    println!("📄 HTML report: {}/Student_Grade_Report.html", output_dir);

    generate_excel_report(&analysis, output_dir)?;
    println!("📊 Excel report: {}/Student_Grade_Report.xlsx", output_dir);

    generate_grades_csv(&analysis, output_dir)?;
    println!("📑 CSV export: {}/all_grades.csv", output_dir);

    print_summary(&analysis);

    println!("\n✅ Analysis complete!");
    println!("Check the output directory for detailed reports.");
    Ok(())
}

fn print_summary(analysis: &CohortAnalysis) {
    println!("\n📊 SUMMARY");
    println!("==========\n");
    println!("Total students: {}", analysis.students.len());
    println!("Students with grade data: {}", analysis.students_with_data);
    println!("Unique subjects: {}", analysis.all_subjects.len());
    println!("🎉 Subjects exceeding target: {}", analysis.total_exceeding);
    println!("✅ Subjects meeting target: {}", analysis.total_meeting);
    println!("⚠️  Subjects below target: {}", analysis.total_below);

    let attention: Vec<&StudentAnalysis> = analysis
        .students
        .iter()
        .filter(|student| student.needs_attention())
        .collect();
    if !attention.is_empty() {
        println!("\n🚨 STUDENTS NEEDING ATTENTION (2+ subjects below target):");
        for student in attention {
            println!(
                "\n   👤 {} ({}, {})",
                student.name, student.school, student.year
            );
            for outcome in &student.subjects {
                if outcome.status == GradeStatus::Below {
                    println!(
                        "      • {}: {} → {}",
                        outcome.subject, outcome.current, outcome.predicted
                    );
                }
            }
        }
    }

    let high_performers: Vec<&StudentAnalysis> = analysis
        .students
        .iter()
        .filter(|student| student.exceeding >= 1)
        .collect();
    if !high_performers.is_empty() {
        println!("\n🌟 HIGH PERFORMERS (exceeding at least one target):");
        for student in high_performers {
            println!(
                "   ⭐ {} ({}) - exceeding in {} subject(s)",
                student.name, student.year, student.exceeding
            );
        }
    }
}

const HTML_STYLE: &str = "\
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; padding: 20px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); min-height: 100vh; }
        .container { max-width: 1200px; margin: 0 auto; background-color: white; padding: 30px; border-radius: 15px; box-shadow: 0 10px 30px rgba(0,0,0,0.2); }
        .header { text-align: center; margin-bottom: 40px; border-bottom: 3px solid #2c3e50; padding-bottom: 20px; }
        .header h1 { color: #2c3e50; margin: 0; font-size: 2.8em; }
        .header p { color: #7f8c8d; margin: 15px 0 0 0; font-size: 1.2em; }
        .generated { font-size: 0.9em; color: #95a5a6; }
        .summary-stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 25px; margin-bottom: 40px; }
        .stat-card { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 25px; border-radius: 15px; text-align: center; }
        .stat-number { font-size: 3em; font-weight: bold; margin-bottom: 10px; }
        .stat-label { font-size: 1em; opacity: 0.9; }
        .section { margin-bottom: 50px; }
        .section h2 { color: #2c3e50; border-left: 6px solid #3498db; padding-left: 20px; margin-bottom: 25px; font-size: 1.8em; }
        .student-card { background-color: #f8f9fa; border: 1px solid #dee2e6; border-radius: 12px; padding: 25px; margin-bottom: 25px; }
        .student-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px; flex-wrap: wrap; }
        .student-name { font-size: 1.4em; font-weight: bold; color: #2c3e50; }
        .student-info { color: #6c757d; font-size: 1em; }
        .grades-table { width: 100%; border-collapse: collapse; margin-top: 15px; }
        .grades-table th, .grades-table td { padding: 12px 15px; text-align: left; border-bottom: 1px solid #dee2e6; }
        .grades-table th { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; }
        .grades-table tr:nth-child(even) { background-color: #f8f9fa; }
        .status-gray { color: #6c757d; }
        .status-blue { color: #007bff; }
        .status-green { color: #28a745; }
        .status-darkgreen { color: #155724; font-weight: bold; }
        .status-red { color: #dc3545; font-weight: bold; }
        .status-yellow { color: #ffc107; }
        .priority-high { border-left: 6px solid #dc3545; }
        .priority-medium { border-left: 6px solid #ffc107; }
        .priority-low { border-left: 6px solid #28a745; }
        .recommendations { background: linear-gradient(135deg, #f8f9fa 0%, #e9ecef 100%); padding: 30px; border-radius: 15px; border: 1px solid #dee2e6; }
        .recommendations ol { line-height: 2; font-size: 1.1em; }
";

fn generate_html_report(analysis: &CohortAnalysis, output_dir: &str) -> Result<()> {
    let generated = chrono::Local::now().format("%B %d, %Y at %I:%M %p");

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("    <title>Student Grade Analysis Report</title>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str("    <style>\n");
    html.push_str(HTML_STYLE);
    html.push_str("    </style>\n</head>\n<body>\n    <div class=\"container\">\n");
    html.push_str("        <div class=\"header\">\n");
    html.push_str("            <h1>🎓 Student Grade Analysis Report</h1>\n");
    html.push_str("            <p>Current vs predicted performance across the cohort</p>\n");
    html.push_str(&format!(
        "            <p class=\"generated\">Generated on {}</p>\n",
        generated
    ));
    html.push_str("        </div>\n");

    html.push_str("        <div class=\"summary-stats\">\n");
    for (number, label) in [
        (analysis.students.len(), "Total Students"),
        (analysis.all_subjects.len(), "Unique Subjects"),
        (analysis.total_exceeding, "Exceeding Targets"),
        (analysis.total_below, "Below Targets"),
    ] {
        html.push_str(&format!(
            "            <div class=\"stat-card\"><div class=\"stat-number\">{}</div><div class=\"stat-label\">{}</div></div>\n",
            number, label
        ));
    }
    html.push_str("        </div>\n");

    html.push_str("        <div class=\"section\">\n            <h2>📊 Student Overview</h2>\n");
    for student in &analysis.students {
        if !student.has_data() {
            continue;
        }
        html.push_str(&format!(
            "            <div class=\"student-card {}\">\n",
            student.priority.css_class()
        ));
        html.push_str("                <div class=\"student-header\">\n");
        html.push_str(&format!(
            "                    <div class=\"student-name\">👤 {}</div>\n",
            escape_html(&student.name)
        ));
        html.push_str(&format!(
            "                    <div class=\"student-info\">🏫 {} | 📅 {}</div>\n",
            escape_html(&student.school),
            escape_html(&student.year)
        ));
        html.push_str("                </div>\n");
        html.push_str("                <table class=\"grades-table\">\n");
        html.push_str("                    <thead><tr><th>Subject</th><th>Current Grade</th><th>Target Grade</th><th>Status</th></tr></thead>\n");
        html.push_str("                    <tbody>\n");
        for outcome in &student.subjects {
            html.push_str(&format!(
                "                        <tr><td><strong>{}</strong></td><td>{}</td><td>{}</td><td class=\"{}\">{} {}</td></tr>\n",
                escape_html(&outcome.subject),
                escape_html(&outcome.current),
                escape_html(&outcome.predicted),
                outcome.status.css_class(),
                outcome.status.icon(),
                outcome.status.label()
            ));
        }
        html.push_str("                    </tbody>\n                </table>\n            </div>\n");
    }
    html.push_str("        </div>\n");

    html.push_str("        <div class=\"section\">\n");
    html.push_str("            <h2>💡 Strategic Recommendations</h2>\n");
    html.push_str("            <div class=\"recommendations\">\n                <ol>\n");
    html.push_str("                    <li><strong>📚 Subject-Specific Tutoring:</strong> Focus additional resources on commonly struggling subjects, particularly Mathematics and English</li>\n");
    html.push_str("                    <li><strong>📈 Progress Monitoring:</strong> Implement weekly progress reviews for students approaching final examinations</li>\n");
    html.push_str("                    <li><strong>🤝 Peer Mentoring:</strong> Establish partnerships between high-achieving and struggling students</li>\n");
    html.push_str("                    <li><strong>📊 Data-Driven Decisions:</strong> Use this analysis to allocate teaching resources and plan intervention strategies</li>\n");
    html.push_str("                </ol>\n            </div>\n        </div>\n");

    html.push_str("    </div>\n</body>\n</html>\n");

    fs::write(Path::new(output_dir).join("Student_Grade_Report.html"), html)?;
    Ok(())
}

fn generate_excel_report(analysis: &CohortAnalysis, output_dir: &str) -> Result<()> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    // Summary sheet: one row per student
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Student Summary")?;
        let headers = [
            "Student Name",
            "School",
            "Year",
            "Total Subjects",
            "Exceeding Target",
            "Meeting Target",
            "Below Target",
            "Priority Level",
            "Needs Attention",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        for (index, student) in analysis.students.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_string(row, 0, student.name.as_str())?;
            sheet.write_string(row, 1, student.school.as_str())?;
            sheet.write_string(row, 2, student.year.as_str())?;
            sheet.write_number(row, 3, student.subjects.len() as f64)?;
            sheet.write_number(row, 4, student.exceeding as f64)?;
            sheet.write_number(row, 5, student.meeting as f64)?;
            sheet.write_number(row, 6, student.below as f64)?;
            sheet.write_string(row, 7, student.priority.as_str())?;
            sheet.write_string(row, 8, if student.needs_attention() { "Yes" } else { "No" })?;
        }
    }

    // Detailed sheet: one row per subject
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("All Grades")?;
        let headers = [
            "Student Name",
            "School",
            "Year",
            "Subject",
            "Current Grade",
            "Target Grade",
            "Status",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        let mut row = 1u32;
        for student in &analysis.students {
            for outcome in &student.subjects {
                sheet.write_string(row, 0, student.name.as_str())?;
                sheet.write_string(row, 1, student.school.as_str())?;
                sheet.write_string(row, 2, student.year.as_str())?;
                sheet.write_string(row, 3, outcome.subject.as_str())?;
                sheet.write_string(row, 4, outcome.current.as_str())?;
                sheet.write_string(row, 5, outcome.predicted.as_str())?;
                sheet.write_string(row, 6, outcome.status.label())?;
                row += 1;
            }
        }
    }

    // Priority sheet: below-target rows for students needing attention
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Priority Students")?;
        let headers = [
            "Student Name",
            "School",
            "Year",
            "Subject",
            "Current Grade",
            "Target Grade",
            "Grade Gap",
            "Action Required",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        let mut row = 1u32;
        for student in &analysis.students {
            if !student.needs_attention() {
                continue;
            }
            let action = if student.priority == analyzer::Priority::High {
                "High"
            } else {
                "Medium"
            };
            for outcome in &student.subjects {
                if outcome.status != GradeStatus::Below {
                    continue;
                }
                sheet.write_string(row, 0, student.name.as_str())?;
                sheet.write_string(row, 1, student.school.as_str())?;
                sheet.write_string(row, 2, student.year.as_str())?;
                sheet.write_string(row, 3, outcome.subject.as_str())?;
                sheet.write_string(row, 4, outcome.current.as_str())?;
                sheet.write_string(row, 5, outcome.predicted.as_str())?;
                sheet.write_string(row, 6, format!("{} → {}", outcome.current, outcome.predicted))?;
                sheet.write_string(row, 7, action)?;
                row += 1;
            }
        }
    }

    workbook.save(Path::new(output_dir).join("Student_Grade_Report.xlsx"))?;
    Ok(())
}

fn generate_grades_csv(analysis: &CohortAnalysis, output_dir: &str) -> Result<()> {
    use csv::Writer;

    let csv_path = Path::new(output_dir).join("all_grades.csv");
    let mut writer = Writer::from_path(csv_path)?;

    writer.write_record([
        "Student Name",
        "School",
        "Year",
        "Subject",
        "Current Grade",
        "Target Grade",
        "Status",
    ])?;

    for student in &analysis.students {
        for outcome in &student.subjects {
            writer.write_record([
                student.name.as_str(),
                student.school.as_str(),
                student.year.as_str(),
                outcome.subject.as_str(),
                outcome.current.as_str(),
                outcome.predicted.as_str(),
                outcome.status.label(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// Clean up previous results from output directory
fn clean_output_directory(output_dir: &str) -> Result<()> {
    let output_path = Path::new(output_dir);

    if !output_path.exists() {
        return Ok(());
    }

    let items_to_clean = [
        "Student_Grade_Report.html",
        "Student_Grade_Report.xlsx",
        "all_grades.csv",
    ];

    for item in &items_to_clean {
        let item_path = output_path.join(item);
        if item_path.is_file() {
            fs::remove_file(&item_path)?;
        }
    }

    Ok(())
}
