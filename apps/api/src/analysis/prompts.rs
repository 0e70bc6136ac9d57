// All LLM prompt templates for the analysis steps.
// Replace `{resume_text}` (summary, gaps, roadmap) or `{summary}` (keywords) before sending.

pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Analyze this resume and provide a comprehensive executive summary. Include:
1. Professional Profile (role, experience level, specializations)
2. Education (institution, degree, GPA if available)
3. Key Technical Skills
4. Notable Projects and Achievements
5. Work Experience highlights

Be thorough and complete. Do not cut off mid-sentence.

Resume:
{resume_text}"#;

pub const GAPS_PROMPT_TEMPLATE: &str = r#"Analyze this resume and identify gaps that could be improved for better job opportunities. Include:
1. Missing technical skills for the target role
2. Certifications that would strengthen the profile
3. Experience gaps (leadership, team size, project scale)
4. Soft skills that could be highlighted
5. Portfolio/GitHub/online presence improvements

Provide actionable recommendations. Be thorough and complete.

Resume:
{resume_text}"#;

pub const ROADMAP_PROMPT_TEMPLATE: &str = r#"Based on this resume, create a strategic career roadmap for the next 1-2 years. Include:
1. Short-term goals (0-6 months): Skills to learn immediately
2. Medium-term goals (6-12 months): Certifications and projects
3. Long-term goals (1-2 years): Career positioning and industry exposure
4. Recommended learning resources and platforms
5. Networking and community engagement suggestions

Be specific and actionable. Complete all sections.

Resume:
{resume_text}"#;

/// The model is asked for a bare JSON array, job titles first. The parser in
/// `keywords.rs` copes when it answers with something else.
pub const KEYWORDS_PROMPT_TEMPLATE: &str = r#"Based on this resume, suggest the best job search keywords.

CRITICAL: Return ONLY a valid JSON array of strings. No explanation, no markdown, just the JSON array.
Example format: ["Software Engineer", "Full Stack Developer", "Python Developer", "Machine Learning", "React"]

IMPORTANT:
- The FIRST 3-5 items MUST be actual job titles (e.g., "Software Engineer", "Backend Developer")
- PRIORITY ORDERING: order these job titles by the candidate's STRONGEST profile match.
  - If the resume is AI-heavy, "AI Engineer" or "Machine Learning Engineer" MUST be first.
  - If the resume is Full Stack heavy, "Full Stack Developer" MUST be first.
  - The most relevant and seniority-appropriate role goes at the very top.
  - Be specific: for a junior candidate, use "Junior ..." titles.
- Job titles should be searchable on LinkedIn
- After job titles, you can include key technologies (most relevant first)
- Avoid overly specific technical jargon that wouldn't be used in job titles
- Maximum 10-12 keywords total

Resume Summary:
{summary}"#;
