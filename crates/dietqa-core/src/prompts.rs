//! Prompt builders
//!
//! Every prompt ends with a fenced ```json example naming the single key the
//! caller reads back from `ChatResponse::json`.

/// Key of the query-suggestion payload
pub const QUERIES_KEY: &str = "queries";
/// Key of the relevance-score payload
pub const SCORE_KEY: &str = "score";
/// Key of the summary payload
pub const SUMMARY_KEY: &str = "summary";
/// Key of the annotation payload
pub const ANNOTATED_KEY: &str = "annotated";

/// Summary the model returns when no part of the speech is relevant
pub const NO_MATCHING_SECTION: &str = "（該当箇所がありません）";

/// Default number of queries requested
pub const DEFAULT_QUERY_COUNT: usize = 5;

/// Ask for `count` exact-match archive queries for a question
pub fn query_suggestion_prompt(question: &str, count: usize) -> String {
    format!(
        r#"ユーザは、下記の「# 質問」の欄に記載された質問への回答を考えようとしています。ユーザが回答を考えるために参考になる文章を、データベースから検索しようとしています。ユーザのために、データベースを検索する検索キーワードを提案してください。出力は、下記の「# 出力形式」の欄に記載されたJSON形式として出力してください。

検索キーワードは完全一致で、複数の単語を空白で結合することでAND検索ができるものとします。

注意点として、このデータベースはあいまい検索に対応しておらず、完全一致でしか検索できないため、検索にヒットするような単語に言い換える選択肢も含めましょう。また、検索は完全一致のため、AND検索の単語数を多くしすぎると文章がヒットしません。そのため、1組のAND検索の検索キーワードに含める単語数は、最大でも2単語程度にしましょう。

回答は{count}組提案してください。

# 質問

```
{question}
```

# 出力形式

```json
{{ "{key}": ["...", "..."] }}
```
"#,
        count = count,
        question = question,
        key = QUERIES_KEY,
    )
}

/// Ask how useful a cleaned speech excerpt is for the question, 0 to 100
pub fn relevance_score_prompt(clean_speech: &str, question: &str) -> String {
    format!(
        r#"下記の「# 文章」の欄に記載された文章は、下記の「# 質問」の欄に記載された質問にどの程度答えているか、または答えるためにどの程度参考になるか、0～100の101段階の整数で答えてください。「100」は質問への回答にそのまま使える情報が文章に含まれている場合、「0」は全く参考にならない場合、とします。出力は、下記の「# 出力形式」の欄に記載されたJSON形式として出力してください。

# 文章

```
{speech}
```

# 質問

```
{question}
```

# 出力形式

```json
{{ "{key}": 0 }}
```
"#,
        speech = clean_speech,
        question = question,
        key = SCORE_KEY,
    )
}

/// Ask for a one-paragraph extract of the parts answering the question
pub fn summary_prompt(clean_speech: &str, question: &str) -> String {
    format!(
        r#"下記の「# 発言」の欄に記載された発言に基づいて、下記の「# 質問」の欄に記載された質問への回答やその理由、関連する背景や事実の説明に該当する部分を抜き出して、1段落にまとめてください。もしそのような部分がない場合は、「{none}」と答えてください。「～でございます」のような丁寧表現は、「～です」のように簡略化してください。ただし、その他の部分については、正確な情報が失われないように、なるべく元の単語を変更しないよう注意してください。絶対に、元の発言に含まれていない内容を追加しないでください。出力は、下記の「# 出力形式」の欄に記載されたJSON形式として出力してください。

# 発言

```
{speech}
```

# 質問

```
{question}
```

# 出力形式

```json
{{ "{key}": "..." }}
```
"#,
        none = NO_MATCHING_SECTION,
        speech = clean_speech,
        question = question,
        key = SUMMARY_KEY,
    )
}

/// Ask for the verbatim speech with `<u>` tags around the parts the summary covers
pub fn annotation_prompt(speech: &str, summary: &str) -> String {
    format!(
        r#"下記の「# 発言」の欄に記載された発言には、下記の「# 要素」の欄に記載された要素の内容が散らばって含まれています。そのような内容に該当する箇所を発言の中から探して、見つかった箇所をそれぞれ<u></u>タグで囲ってください。タグの追加を除いて、発言の文面は一言一句変更せず、全角・半角などの文字種も変更しないでください。出力は、下記の「# 出力形式」の欄に記載されたJSON形式（改行は"\n"）として出力してください。

# 発言

```
{speech}
```

# 要素

```
{summary}
```

# 出力形式

```json
{{ "{key}": "..." }}
```
"#,
        speech = speech,
        summary = summary,
        key = ANNOTATED_KEY,
    )
}
