use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// English stop words removed before weighting.
pub const STOP_WORDS: &[&str] = &[
	"a","about","above","after","again","against","all","also","am","an","and","any","are","as","at",
	"be","because","been","before","being","below","between","both","but","by",
	"can","could","did","do","does","doing","down","during","each","either","else","few","for","from","further",
	"had","has","have","having","he","her","here","hers","him","his","how","however",
	"i","if","in","into","is","it","its","itself","just","may","me","might","more","most","must","my",
	"neither","no","nor","not","of","off","on","once","only","or","other","our","ours","out","over","own",
	"same","shall","she","should","so","some","such","than","that","the","their","theirs","them","then","there",
	"these","they","this","those","through","to","too","under","until","up","upon","very",
	"was","we","were","what","when","where","which","while","who","whom","whose","why","will","with","would",
	"you","your","yours",
];

/// Lowercasing, stop-word removing tokenizer shared by corpus and query.
///
/// Tokens are alphanumeric runs of at least two characters.
#[derive(Clone)]
pub struct Analyzer {
	inner: TextAnalyzer,
}

impl Default for Analyzer {
	fn default() -> Self {
		let inner = TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(LowerCaser)
			.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| (*s).to_string())))
			.build();
		Self { inner }
	}
}

impl Analyzer {
	pub fn tokens(&mut self, text: &str) -> Vec<String> {
		let mut out = Vec::new();
		let mut stream = self.inner.token_stream(text);
		while stream.advance() {
			let t = &stream.token().text;
			if t.chars().count() >= 2 { out.push(t.clone()); }
		}
		out
	}
}
