use super::core::ParseError;
use super::core::ParseResult;
use super::core::Parser;
use std::fmt;
use std::marker::PhantomData;

/// Matches one input item equal to `value`.
#[derive(Clone)]
pub struct Equal<I> {
    value: I,
}

impl<I> Equal<I> {
    pub fn new(value: I) -> Self {
        Self { value }
    }
}

impl<I: Clone + PartialEq + fmt::Display> Parser<I, I> for Equal<I> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<I> {
        match input.get(pos) {
            Some(found) if *found == self.value => Ok((pos + 1, found.clone())),
            Some(found) => Err(ParseError::Unexpected {
                expected: self.value.to_string(),
                parsed: found.to_string(),
                position: pos,
                context: None,
            }),
            None => Err(ParseError::UnexpectedEOF {
                message: format!("expected {}", self.value),
                position: pos,
                context: None,
            }),
        }
    }
}

/// Consumes one input item when `f` maps it to `Some`.
#[derive(Clone)]
pub struct Satisfy<I, O, F> {
    f: F,
    expected: &'static str,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O, F> Satisfy<I, O, F> {
    pub fn new(f: F, expected: &'static str) -> Self {
        Self {
            f,
            expected,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, F> Parser<I, O> for Satisfy<I, O, F>
where
    I: fmt::Display,
    F: Fn(&I) -> Option<O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        match input.get(pos) {
            Some(item) => match (self.f)(item) {
                Some(result) => Ok((pos + 1, result)),
                None => Err(ParseError::Unexpected {
                    expected: self.expected.to_string(),
                    parsed: item.to_string(),
                    position: pos,
                    context: None,
                }),
            },
            None => Err(ParseError::UnexpectedEOF {
                message: format!("expected {}", self.expected),
                position: pos,
                context: None,
            }),
        }
    }
}

/// Tries each parser in order and returns the first success.
///
/// When every alternative fails, the error that got furthest into the input
/// is reported, so a failure deep inside a parenthesised group is not hidden
/// behind a generic "no alternative".
pub struct Choice<I, O> {
    parsers: Vec<Box<dyn Parser<I, O>>>,
}

impl<I, O> Choice<I, O> {
    pub fn new(parsers: Vec<Box<dyn Parser<I, O>>>) -> Self {
        Self { parsers }
    }
}

impl<I, O> Parser<I, O> for Choice<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let mut furthest: Option<ParseError> = None;
        for parser in &self.parsers {
            match parser.parse(input, pos) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    let further = furthest
                        .as_ref()
                        .map_or(true, |f| e.get_position() > f.get_position());
                    if further {
                        furthest = Some(e);
                    }
                }
            }
        }
        match furthest {
            Some(e) if e.get_position() > pos => Err(e),
            _ => Err(ParseError::NoAlternative {
                position: pos,
                context: None,
            }),
        }
    }
}

#[derive(Clone)]
pub struct Preceded<P1, P2, I, O> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O)>,
}

impl<P1, P2, I, O> Preceded<P1, P2, I, O> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O> Parser<I, O> for Preceded<P1, P2, I, O>
where
    P1: Parser<I, ()>,
    P2: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.parser1.parse(input, pos)?;
        self.parser2.parse(input, pos)
    }
}

#[derive(Clone)]
pub struct Map<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> Map<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        self.parser
            .parse(input, pos)
            .map(|(pos, value)| (pos, (self.f)(value)))
    }
}

/// Runs a parser and discards its output.
#[derive(Clone)]
pub struct AsUnit<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> AsUnit<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, P, O> Parser<I, ()> for AsUnit<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<()> {
        self.parser.parse(input, pos).map(|(pos, _)| (pos, ()))
    }
}

#[derive(Clone)]
pub struct Many<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Many<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut current_pos = pos;

        while let Ok((new_pos, value)) = self.parser.parse(input, current_pos) {
            // a parser that consumes nothing would loop forever
            if new_pos == current_pos {
                break;
            }
            results.push(value);
            current_pos = new_pos;
        }

        Ok((current_pos, results))
    }
}

/// Zero or more items separated by `separator`.
///
/// A trailing separator is not consumed, so `f(a,)` leaves the comma for the
/// enclosing parser to reject.
pub struct SeparatedList<P, S, I, O> {
    item_parser: P,
    separator_parser: S,
    _phantom: PhantomData<(I, O)>,
}

impl<P, S, I, O> SeparatedList<P, S, I, O> {
    pub fn new(item_parser: P, separator_parser: S) -> Self {
        Self {
            item_parser,
            separator_parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, I, O>
where
    P: Parser<I, O>,
    S: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut current_pos = pos;

        match self.item_parser.parse(input, current_pos) {
            Err(e) if e.get_position() > current_pos => return Err(e),
            Err(_) => {}
            Ok((new_pos, value)) => {
                results.push(value);
                current_pos = new_pos;

                while let Ok((sep_pos, _)) = self.separator_parser.parse(input, current_pos) {
                    match self.item_parser.parse(input, sep_pos) {
                        Ok((new_pos, value)) => {
                            results.push(value);
                            current_pos = new_pos;
                        }
                        Err(e) => {
                            // separator seen but the item after it is broken
                            if e.get_position() > sep_pos {
                                return Err(e);
                            }
                            break;
                        }
                    }
                }
            }
        }

        Ok((current_pos, results))
    }
}

#[derive(Clone)]
pub struct Optional<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Optional<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Option<O>> for Optional<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Option<O>> {
        match self.parser.parse(input, pos) {
            Ok((new_pos, value)) => Ok((new_pos, Some(value))),
            Err(_) => Ok((pos, None)),
        }
    }
}

#[derive(Clone)]
pub struct Tuple2<P1, P2, I, O1, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1, O2)>,
}

impl<P1, P2, I, O1, O2> Tuple2<P1, P2, I, O1, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, (O1, O2)> for Tuple2<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        Ok((pos, (result1, result2)))
    }
}

#[derive(Clone)]
pub struct Delimited<L, P, R, I, O> {
    left: L,
    parser: P,
    right: R,
    _phantom: PhantomData<(I, O)>,
}

impl<L, P, R, I, O> Delimited<L, P, R, I, O> {
    pub fn new(left: L, parser: P, right: R) -> Self {
        Self {
            left,
            parser,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, L, P, R> Parser<I, O> for Delimited<L, P, R, I, O>
where
    L: Parser<I, ()>,
    P: Parser<I, O>,
    R: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.left.parse(input, pos)?;
        let (pos, value) = self.parser.parse(input, pos)?;
        let (pos, _) = self.right.parse(input, pos)?;
        Ok((pos, value))
    }
}

#[derive(Clone)]
pub struct WithContext<P, C> {
    parser: P,
    context: C,
}

impl<P, C> WithContext<P, C> {
    pub fn new(parser: P, context: C) -> Self {
        Self { parser, context }
    }
}

impl<I, O, P, C: ToString> Parser<I, O> for WithContext<P, C>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser
            .parse(input, pos)
            .map_err(|e| e.with_context(&self.context.to_string()))
    }
}

/// Builds the wrapped parser on each use; breaks construction cycles in
/// recursive grammars.
#[derive(Clone)]
pub struct Lazy<F> {
    f: F,
}

impl<F> Lazy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (self.f)().parse(input, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit() -> Satisfy<char, u32, impl Fn(&char) -> Option<u32>> {
        Satisfy::new(|c: &char| c.to_digit(10), "digit")
    }

    #[test]
    fn test_equal() {
        let input = vec!['a', 'b'];
        let parser = Equal::new('a');
        assert_eq!(parser.parse(&input, 0), Ok((1, 'a')));
        assert!(matches!(
            parser.parse(&input, 1),
            Err(ParseError::Unexpected { position: 1, .. })
        ));
        assert!(matches!(
            parser.parse(&input, 2),
            Err(ParseError::UnexpectedEOF { position: 2, .. })
        ));
    }

    #[test]
    fn test_satisfy() {
        let input = vec!['7', 'x'];
        assert_eq!(digit().parse(&input, 0), Ok((1, 7)));
        assert!(matches!(
            digit().parse(&input, 1),
            Err(ParseError::Unexpected { ref expected, .. }) if expected == "digit"
        ));
    }

    #[test]
    fn test_choice_reports_furthest_error() {
        let input = vec!['a', 'b', 'x'];
        let ab = Map::new(
            Tuple2::new(Equal::new('a'), Tuple2::new(Equal::new('b'), Equal::new('c'))),
            |_: (char, (char, char))| "abc",
        );
        let z = Map::new(Equal::new('z'), |_: char| "z");
        let parser: Choice<char, &str> = Choice::new(vec![Box::new(ab), Box::new(z)]);
        assert!(matches!(
            parser.parse(&input, 0),
            Err(ParseError::Unexpected { position: 2, .. })
        ));

        let input = vec!['q'];
        assert!(matches!(
            parser.parse(&input, 0),
            Err(ParseError::NoAlternative { position: 0, .. })
        ));
    }

    #[test]
    fn test_many_and_optional() {
        let input = vec!['1', '2', 'x'];
        assert_eq!(Many::new(digit()).parse(&input, 0), Ok((2, vec![1, 2])));
        assert_eq!(Many::new(digit()).parse(&input, 2), Ok((2, vec![])));
        assert_eq!(Optional::new(digit()).parse(&input, 2), Ok((2, None)));
    }

    #[test]
    fn test_separated_list() {
        let input = vec!['1', ',', '2', ',', '3'];
        let parser = SeparatedList::new(digit(), AsUnit::new(Equal::new(',')));
        assert_eq!(parser.parse(&input, 0), Ok((5, vec![1, 2, 3])));

        let input = vec!['1', ','];
        assert_eq!(parser.parse(&input, 0), Ok((1, vec![1])));

        let input: Vec<char> = vec![];
        assert_eq!(parser.parse(&input, 0), Ok((0, vec![])));
    }

    #[test]
    fn test_delimited_and_preceded() {
        let input = vec!['(', '4', ')'];
        let parser = Delimited::new(
            AsUnit::new(Equal::new('(')),
            digit(),
            AsUnit::new(Equal::new(')')),
        );
        assert_eq!(parser.parse(&input, 0), Ok((3, 4)));

        let parser = Preceded::new(AsUnit::new(Equal::new('(')), digit());
        assert_eq!(parser.parse(&input, 0), Ok((2, 4)));
    }

    #[test]
    fn test_with_context_chains() {
        let input = vec!['x'];
        let parser = WithContext::new(WithContext::new(digit(), "inner"), "outer");
        let err = parser.parse(&input, 0).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unexpected { context: Some(ref c), .. } if c == "inner -> outer"
        ));
    }
}
